use bevy::color::ColorToComponents;
use bevy::prelude::*;

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, tick_keyframe_animations);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interpolation {
    Linear,
    /// Cardinal spline; `tension` scales the neighbour-difference tangents.
    Spline { tension: f32 },
}

/// Values a track can blend between.
pub trait Animatable: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
    /// Cubic Hermite blend between `p0` and `p1` with tangents `m0`, `m1`.
    fn hermite(p0: Self, p1: Self, m0: Self, m1: Self, t: f32) -> Self;
    fn tangent(prev: Self, next: Self, tension: f32) -> Self;
}

fn hermite_weights(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    (
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    )
}

impl Animatable for Vec3 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn hermite(p0: Self, p1: Self, m0: Self, m1: Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_weights(t);
        p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
    }

    fn tangent(prev: Self, next: Self, tension: f32) -> Self {
        (next - prev) * tension
    }
}

impl Animatable for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn hermite(p0: Self, p1: Self, m0: Self, m1: Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_weights(t);
        p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
    }

    fn tangent(prev: Self, next: Self, tension: f32) -> Self {
        (next - prev) * tension
    }
}

impl Animatable for LinearRgba {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        LinearRgba::from_vec4(a.to_vec4().lerp(b.to_vec4(), t))
    }

    fn hermite(p0: Self, p1: Self, m0: Self, m1: Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_weights(t);
        LinearRgba::from_vec4(
            p0.to_vec4() * h00 + m0.to_vec4() * h10 + p1.to_vec4() * h01 + m1.to_vec4() * h11,
        )
    }

    fn tangent(prev: Self, next: Self, tension: f32) -> Self {
        LinearRgba::from_vec4((next.to_vec4() - prev.to_vec4()) * tension)
    }
}

/// A looping keyframe track. Keys are kept sorted by time and a key set at an
/// existing time replaces the old value.
#[derive(Clone, Debug)]
pub struct Track<T> {
    keys: Vec<(f32, T)>,
    pub interpolation: Interpolation,
}

impl<T: Animatable> Track<T> {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            keys: Vec::new(),
            interpolation,
        }
    }

    pub fn linear() -> Self {
        Self::new(Interpolation::Linear)
    }

    pub fn spline(tension: f32) -> Self {
        Self::new(Interpolation::Spline { tension })
    }

    pub fn with_key(mut self, time: f32, value: T) -> Self {
        self.set_key(time, value);
        self
    }

    pub fn set_key(&mut self, time: f32, value: T) {
        let time = time.max(0.0);
        match self.keys.binary_search_by(|(t, _)| t.total_cmp(&time)) {
            Ok(i) => self.keys[i].1 = value,
            Err(i) => self.keys.insert(i, (time, value)),
        }
    }

    #[allow(dead_code)]
    pub fn keys(&self) -> &[(f32, T)] {
        &self.keys
    }

    /// Time of the last key; the track repeats with this period.
    pub fn duration(&self) -> f32 {
        self.keys.last().map_or(0.0, |(t, _)| *t)
    }

    pub fn sample(&self, time: f32) -> Option<T> {
        let (first, last) = (self.keys.first()?, self.keys.last()?);
        let duration = self.duration();
        if self.keys.len() == 1 || duration <= 0.0 {
            return Some(first.1);
        }
        let t = time.rem_euclid(duration);
        if t <= first.0 {
            return Some(first.1);
        }

        let next = self.keys.partition_point(|(k, _)| *k <= t);
        if next >= self.keys.len() {
            return Some(last.1);
        }
        let index = next - 1;
        let (t0, v0) = self.keys[index];
        let (t1, v1) = self.keys[next];
        let span = t1 - t0;
        let f = if span > 0.0 { (t - t0) / span } else { 0.0 };

        Some(match self.interpolation {
            Interpolation::Linear => T::lerp(v0, v1, f),
            Interpolation::Spline { tension } => {
                let prev = self.keys[index.saturating_sub(1)].1;
                let after = self.keys[(next + 1).min(self.keys.len() - 1)].1;
                let m0 = T::tangent(prev, v1, tension);
                let m1 = T::tangent(v0, after, tension);
                T::hermite(v0, v1, m0, m1, f)
            }
        })
    }
}

/// Drives an entity's transform and, for lights, its colour from keyframe tracks.
#[derive(Component, Clone, Default)]
pub struct KeyframeAnimation {
    pub translation: Option<Track<Vec3>>,
    /// Rotation about the world Y axis, in degrees.
    pub yaw_degrees: Option<Track<f32>>,
    pub light_color: Option<Track<LinearRgba>>,
    pub elapsed: f32,
}

impl KeyframeAnimation {
    fn apply(&self, transform: &mut Transform, light: Option<&mut PointLight>) {
        let t = self.elapsed;
        if let Some(pos) = self.translation.as_ref().and_then(|tr| tr.sample(t)) {
            transform.translation = pos;
        }
        if let Some(yaw) = self.yaw_degrees.as_ref().and_then(|tr| tr.sample(t)) {
            transform.rotation = Quat::from_rotation_y(yaw.to_radians());
        }
        if let (Some(light), Some(color)) =
            (light, self.light_color.as_ref().and_then(|tr| tr.sample(t)))
        {
            light.color = Color::LinearRgba(color);
        }
    }
}

fn tick_keyframe_animations(
    time: Res<Time>,
    mut query: Query<(&mut KeyframeAnimation, &mut Transform, Option<&mut PointLight>)>,
) {
    let dt = time.delta_secs();
    for (mut anim, mut transform, light) in query.iter_mut() {
        anim.elapsed += dt;
        anim.apply(&mut transform, light.map(|l| l.into_inner()));
    }
}
