//! The rigid-body world.
//!
//! Balls are spheres; all static geometry is oriented boxes. The solver is
//! sequential impulses with positional correction, run at a fixed substep and
//! subdivided so a ball at full stroke speed moves less than its radius per
//! solver iteration.

use glam::{DQuat, DVec3, EulerRot};

use crate::material::{ContactProfile, ContactProfiles};
use crate::{
    ANGULAR_DAMPING, BALL_MASS, BALL_RADIUS, BodyId, GRAVITY, LINEAR_DAMPING, MAX_SUBSTEPS,
    REST_ANGULAR_SPEED, REST_LINEAR_SPEED, REST_SUSTAIN_SECONDS, SLEEP_SPEED_LIMIT,
    SLEEP_TIME_LIMIT, Tick,
};

/// Solver iterations per fixed substep.
const SOLVER_ITERATIONS: u32 = 4;

/// Distance within which a ball is treated as touching a collider.
const CONTACT_SLOP: f64 = 1e-4;

/// Approach speeds below this are resolved without bounce.
const RESTITUTION_THRESHOLD: f64 = 0.2;

/// Scales surface friction into a rolling deceleration.
const ROLLING_RESISTANCE: f64 = 0.35;

/// A contact normal with at least this much upward component is a floor.
const FLOOR_NORMAL_MIN_Y: f64 = 0.5;

/// Slack for floating-point accumulation of substep time.
const TIME_EPSILON: f64 = 1e-9;

// ============================================================================
// Static Geometry
// ============================================================================

/// An immovable oriented box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticCollider {
    pub center: DVec3,
    pub half_extents: DVec3,
    pub rotation: DQuat,
    pub profile: ContactProfile,
}

impl StaticCollider {
    pub fn new(center: DVec3, half_extents: DVec3, profile: ContactProfile) -> Self {
        Self {
            center,
            half_extents,
            rotation: DQuat::IDENTITY,
            profile,
        }
    }

    /// Orient the box by XYZ Euler angles in radians.
    pub fn with_euler(mut self, euler: DVec3) -> Self {
        self.rotation = DQuat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
        self
    }

    fn contact(&self, center: DVec3, radius: f64) -> Option<Contact> {
        let local = self.rotation.inverse() * (center - self.center);
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        let delta = local - clamped;
        let distance_sq = delta.length_squared();

        let (local_normal, penetration) = if distance_sq > 0.0 {
            let distance = distance_sq.sqrt();
            if distance > radius + CONTACT_SLOP {
                return None;
            }
            (delta / distance, radius - distance)
        } else {
            // Centre is inside the box: leave through the nearest face.
            let depth = self.half_extents - local.abs();
            let axis = if depth.x <= depth.y && depth.x <= depth.z {
                0
            } else if depth.y <= depth.z {
                1
            } else {
                2
            };
            let mut normal = DVec3::ZERO;
            normal[axis] = if local[axis] < 0.0 { -1.0 } else { 1.0 };
            (normal, depth[axis] + radius)
        };

        Some(Contact {
            normal: self.rotation * local_normal,
            penetration,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    normal: DVec3,
    penetration: f64,
}

// ============================================================================
// Bodies
// ============================================================================

#[derive(Debug, Clone)]
struct Body {
    id: BodyId,
    position: DVec3,
    velocity: DVec3,
    angular_velocity: DVec3,
    radius: f64,
    inv_mass: f64,
    /// Floor normal from the latest solver iteration, if touching one.
    grounded: Option<DVec3>,
    /// Seconds spent continuously under the rest thresholds.
    quiet_time: f64,
    /// Seconds spent continuously under the sleep threshold.
    sleep_time: f64,
    sleeping: bool,
    /// Frozen in place; neither integrated nor collided.
    parked: bool,
}

impl Body {
    fn new(id: BodyId, position: DVec3) -> Self {
        Self {
            id,
            position,
            velocity: DVec3::ZERO,
            angular_velocity: DVec3::ZERO,
            radius: BALL_RADIUS,
            inv_mass: 1.0 / BALL_MASS,
            grounded: None,
            quiet_time: 0.0,
            sleep_time: 0.0,
            sleeping: false,
            parked: false,
        }
    }

    fn is_active(&self) -> bool {
        !self.parked && !self.sleeping
    }

    fn wake(&mut self) {
        self.sleeping = false;
        self.sleep_time = 0.0;
    }

    fn teleport(&mut self, position: DVec3) {
        self.position = position;
        self.velocity = DVec3::ZERO;
        self.angular_velocity = DVec3::ZERO;
        self.grounded = None;
        self.quiet_time = 0.0;
        self.wake();
    }
}

// ============================================================================
// World
// ============================================================================

/// The physics world for one session.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    tick: Tick,
    tick_rate_hz: u32,
    fixed_dt: f64,
    accumulator: f64,
    gravity: DVec3,
    profiles: ContactProfiles,
    /// Sorted by id ascending.
    bodies: Vec<Body>,
    statics: Vec<StaticCollider>,
}

impl PhysicsWorld {
    /// Create an empty world with the default contact profiles.
    ///
    /// # Panics
    /// Panics if `tick_rate_hz` is zero.
    pub fn new(tick_rate_hz: u32) -> Self {
        Self::with_profiles(tick_rate_hz, ContactProfiles::default())
    }

    pub fn with_profiles(tick_rate_hz: u32, profiles: ContactProfiles) -> Self {
        assert!(tick_rate_hz > 0, "tick_rate_hz must be > 0");
        Self {
            tick: 0,
            tick_rate_hz,
            fixed_dt: 1.0 / f64::from(tick_rate_hz),
            accumulator: 0.0,
            gravity: DVec3::new(0.0, GRAVITY, 0.0),
            profiles,
            bodies: Vec::new(),
            statics: Vec::new(),
        }
    }

    /// Fixed substeps executed so far.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    pub fn profiles(&self) -> &ContactProfiles {
        &self.profiles
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index_of(id).is_ok()
    }

    /// Ids of every body in ascending order.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.iter().map(|b| b.id)
    }

    // ------------------------------------------------------------------------
    // Body lifecycle
    // ------------------------------------------------------------------------

    /// Add a ball at `position`, replacing any existing body with this id.
    pub fn add_body(&mut self, id: BodyId, position: DVec3) {
        match self.index_of(id) {
            Ok(index) => self.bodies[index] = Body::new(id, position),
            Err(index) => self.bodies.insert(index, Body::new(id, position)),
        }
    }

    /// Returns false if no such body exists.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        match self.index_of(id) {
            Ok(index) => {
                self.bodies.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
    }

    /// Add `impulse` (N·s) to the body's momentum. Parked bodies ignore impulses.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: DVec3) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        if body.parked || !impulse.is_finite() {
            return false;
        }
        body.velocity += impulse * body.inv_mass;
        body.quiet_time = 0.0;
        body.wake();
        true
    }

    /// Teleport the body and zero its velocity.
    pub fn set_position(&mut self, id: BodyId, position: DVec3) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        body.teleport(position);
        body.parked = false;
        true
    }

    /// Teleport the body and freeze it there until the next `set_position`.
    pub fn park(&mut self, id: BodyId, position: DVec3) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        body.teleport(position);
        body.parked = true;
        true
    }

    pub fn set_radius(&mut self, id: BodyId, radius: f64) -> bool {
        if !radius.is_finite() || radius <= 0.0 {
            return false;
        }
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        if body.radius != radius {
            body.radius = radius;
            body.wake();
        }
        true
    }

    // ------------------------------------------------------------------------
    // Body queries
    // ------------------------------------------------------------------------

    pub fn position(&self, id: BodyId) -> Option<DVec3> {
        self.body(id).map(|b| b.position)
    }

    pub fn velocity(&self, id: BodyId) -> Option<DVec3> {
        self.body(id).map(|b| b.velocity)
    }

    pub fn angular_velocity(&self, id: BodyId) -> Option<DVec3> {
        self.body(id).map(|b| b.angular_velocity)
    }

    pub fn linear_speed(&self, id: BodyId) -> Option<f64> {
        self.body(id).map(|b| b.velocity.length())
    }

    pub fn radius(&self, id: BodyId) -> Option<f64> {
        self.body(id).map(|b| b.radius)
    }

    /// True once linear and angular speed have both stayed under the rest
    /// thresholds for [`REST_SUSTAIN_SECONDS`]. A missing body is at rest.
    pub fn is_at_rest(&self, id: BodyId) -> bool {
        match self.body(id) {
            Some(body) => {
                body.parked
                    || body.sleeping
                    || body.quiet_time + TIME_EPSILON >= REST_SUSTAIN_SECONDS
            }
            None => true,
        }
    }

    pub fn is_sleeping(&self, id: BodyId) -> bool {
        self.body(id).is_some_and(|b| b.sleeping)
    }

    pub fn is_parked(&self, id: BodyId) -> bool {
        self.body(id).is_some_and(|b| b.parked)
    }

    // ------------------------------------------------------------------------
    // Static geometry
    // ------------------------------------------------------------------------

    pub fn add_static_geometry(&mut self, collider: StaticCollider) {
        self.statics.push(collider);
    }

    pub fn clear_static_geometry(&mut self) {
        self.statics.clear();
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn statics(&self) -> &[StaticCollider] {
        &self.statics
    }

    // ------------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------------

    /// Advance by `dt` seconds of wall-clock time.
    ///
    /// Time is consumed in fixed substeps of `1 / tick_rate_hz`, at most
    /// [`MAX_SUBSTEPS`] per call; time beyond that cap is discarded. Returns
    /// the number of substeps run.
    pub fn step(&mut self, dt: f64) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator + TIME_EPSILON >= self.fixed_dt && substeps < MAX_SUBSTEPS {
            self.substep();
            self.accumulator -= self.fixed_dt;
            substeps += 1;
        }

        if self.accumulator + TIME_EPSILON >= self.fixed_dt {
            self.accumulator = 0.0;
        }
        self.accumulator = self.accumulator.max(0.0);
        substeps
    }

    fn substep(&mut self) {
        let h = self.fixed_dt / f64::from(SOLVER_ITERATIONS);
        for _ in 0..SOLVER_ITERATIONS {
            self.integrate_velocities(h);
            self.resolve_static_contacts(h);
            self.resolve_ball_contacts();
            self.integrate_positions(h);
        }
        self.update_rest_state(self.fixed_dt);
        self.tick += 1;
    }

    fn integrate_velocities(&mut self, h: f64) {
        let gravity = self.gravity;
        let linear_keep = (1.0 - LINEAR_DAMPING).powf(h);
        let angular_keep = (1.0 - ANGULAR_DAMPING).powf(h);

        for body in self.bodies.iter_mut().filter(|b| b.is_active()) {
            body.velocity = (body.velocity + gravity * h) * linear_keep;
            body.angular_velocity *= angular_keep;
        }
    }

    fn resolve_static_contacts(&mut self, h: f64) {
        let gravity_magnitude = self.gravity.length();
        let statics = &self.statics;

        for body in self.bodies.iter_mut().filter(|b| b.is_active()) {
            body.grounded = None;

            for collider in statics {
                let Some(contact) = collider.contact(body.position, body.radius) else {
                    continue;
                };
                if contact.penetration > 0.0 {
                    body.position += contact.normal * contact.penetration;
                }

                let normal_speed = body.velocity.dot(contact.normal);
                let mut normal_impulse = 0.0;
                if normal_speed < 0.0 {
                    let restitution = if -normal_speed > RESTITUTION_THRESHOLD {
                        collider.profile.restitution
                    } else {
                        0.0
                    };
                    normal_impulse = -normal_speed * (1.0 + restitution);
                    body.velocity += contact.normal * normal_impulse;
                }

                let is_floor = contact.normal.y > FLOOR_NORMAL_MIN_Y;
                let tangential =
                    body.velocity - contact.normal * body.velocity.dot(contact.normal);
                let tangential_speed = tangential.length();
                if tangential_speed > 0.0 {
                    let drop = if is_floor {
                        collider.profile.friction
                            * ROLLING_RESISTANCE
                            * gravity_magnitude
                            * contact.normal.y
                            * h
                    } else {
                        collider.profile.friction * normal_impulse
                    };
                    if drop >= tangential_speed {
                        body.velocity -= tangential;
                    } else {
                        body.velocity -= tangential * (drop / tangential_speed);
                    }
                }

                if is_floor {
                    body.grounded = Some(contact.normal);
                }
            }
        }
    }

    fn resolve_ball_contacts(&mut self) {
        let profile = self.profiles.ball;
        let count = self.bodies.len();

        for j in 1..count {
            let (left, right) = self.bodies.split_at_mut(j);
            let b = &mut right[0];
            for a in left.iter_mut() {
                if a.parked || b.parked || (a.sleeping && b.sleeping) {
                    continue;
                }

                let offset = b.position - a.position;
                let distance = offset.length();
                let reach = a.radius + b.radius;
                if distance >= reach || distance <= f64::EPSILON {
                    continue;
                }

                let normal = offset / distance;
                let total_inv_mass = a.inv_mass + b.inv_mass;
                let penetration = reach - distance;
                a.position -= normal * penetration * (a.inv_mass / total_inv_mass);
                b.position += normal * penetration * (b.inv_mass / total_inv_mass);

                let relative = (b.velocity - a.velocity).dot(normal);
                if relative >= 0.0 {
                    continue;
                }

                let restitution = if -relative > RESTITUTION_THRESHOLD {
                    profile.restitution
                } else {
                    0.0
                };
                let impulse = -(1.0 + restitution) * relative / total_inv_mass;
                a.velocity -= normal * impulse * a.inv_mass;
                b.velocity += normal * impulse * b.inv_mass;

                let relative_velocity = b.velocity - a.velocity;
                let tangent = relative_velocity - normal * relative_velocity.dot(normal);
                let tangent_speed = tangent.length();
                if tangent_speed > 0.0 {
                    let friction = (profile.friction * impulse).min(tangent_speed / total_inv_mass);
                    let direction = tangent / tangent_speed;
                    a.velocity += direction * friction * a.inv_mass;
                    b.velocity -= direction * friction * b.inv_mass;
                }

                a.quiet_time = 0.0;
                b.quiet_time = 0.0;
                a.wake();
                b.wake();
            }
        }
    }

    fn integrate_positions(&mut self, h: f64) {
        for body in self.bodies.iter_mut().filter(|b| b.is_active()) {
            body.position += body.velocity * h;
            if let Some(normal) = body.grounded {
                body.angular_velocity = normal.cross(body.velocity) / body.radius;
            }
        }
    }

    fn update_rest_state(&mut self, dt: f64) {
        for body in self.bodies.iter_mut().filter(|b| b.is_active()) {
            let speed = body.velocity.length();
            let spin = body.angular_velocity.length();

            if speed < REST_LINEAR_SPEED && spin < REST_ANGULAR_SPEED {
                body.quiet_time += dt;
            } else {
                body.quiet_time = 0.0;
            }

            if speed < SLEEP_SPEED_LIMIT && spin < SLEEP_SPEED_LIMIT {
                body.sleep_time += dt;
                if body.sleep_time + TIME_EPSILON >= SLEEP_TIME_LIMIT {
                    body.sleeping = true;
                    body.velocity = DVec3::ZERO;
                    body.angular_velocity = DVec3::ZERO;
                }
            } else {
                body.sleep_time = 0.0;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Digest
    // ------------------------------------------------------------------------

    /// FNV-1a 64-bit digest over the substep counter and every body's
    /// position and velocity, in id order.
    ///
    /// `-0.0` hashes as `+0.0` and every NaN hashes as the canonical quiet NaN.
    pub fn state_digest(&self) -> u64 {
        let mut hasher = Fnv1a64::new();
        hasher.update(&self.tick.to_le_bytes());
        hasher.update(&(self.bodies.len() as u64).to_le_bytes());

        for body in &self.bodies {
            hasher.update(&body.id.to_le_bytes());
            for value in body
                .position
                .to_array()
                .into_iter()
                .chain(body.velocity.to_array())
            {
                hasher.update(&canonicalize_f64(value).to_le_bytes());
            }
        }

        hasher.finish()
    }

    fn index_of(&self, id: BodyId) -> Result<usize, usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id)
    }

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).ok().map(|i| &self.bodies[i])
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index_of(id).ok().map(|i| &mut self.bodies[i])
    }
}

const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV1A_PRIME: u64 = 0x100000001b3;

struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn finish(self) -> u64 {
        self.state
    }
}

fn canonicalize_f64(value: f64) -> u64 {
    const QUIET_NAN_BITS: u64 = 0x7ff8000000000000;

    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn floor() -> StaticCollider {
        StaticCollider::new(
            DVec3::new(0.0, -0.05, 0.0),
            DVec3::new(2.0, 0.05, 2.0),
            ContactProfiles::default().grass,
        )
    }

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(60);
        world.add_static_geometry(floor());
        world
    }

    fn run(world: &mut PhysicsWorld, steps: usize) {
        for _ in 0..steps {
            world.step(DT);
        }
    }

    #[test]
    #[should_panic(expected = "tick_rate_hz must be > 0")]
    fn test_zero_tick_rate_panics() {
        let _ = PhysicsWorld::new(0);
    }

    #[test]
    fn test_ball_drops_and_settles_on_floor() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(0.0, 0.05, 0.0));

        run(&mut world, 120);

        let position = world.position(1).unwrap();
        assert!((position.y - BALL_RADIUS).abs() < 1e-3, "y = {}", position.y);
        assert!(world.is_at_rest(1));
    }

    #[test]
    fn test_rest_requires_sustained_interval() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));

        world.step(DT);
        assert!(!world.is_at_rest(1));

        run(&mut world, 10);
        assert!(world.is_at_rest(1));
    }

    #[test]
    fn test_missing_body_is_at_rest() {
        let world = PhysicsWorld::new(60);
        assert!(world.is_at_rest(42));
        assert_eq!(world.position(42), None);
    }

    #[test]
    fn test_impulse_rolls_ball_until_friction_stops_it() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(-1.5, BALL_RADIUS, 0.0));
        run(&mut world, 10);

        assert!(world.apply_impulse(1, DVec3::new(0.05, 0.0, 0.0)));
        assert!(!world.is_at_rest(1));
        assert!(world.linear_speed(1).unwrap() > 1.0);

        run(&mut world, 600);

        let position = world.position(1).unwrap();
        assert!(position.x > -1.4, "ball should have rolled, x = {}", position.x);
        assert!(world.is_at_rest(1));
    }

    #[test]
    fn test_ice_rolls_further_than_sand() {
        let profiles = ContactProfiles::default();
        let distance_on = |profile: ContactProfile| {
            let mut world = PhysicsWorld::new(60);
            world.add_static_geometry(StaticCollider::new(
                DVec3::new(0.0, -0.05, 0.0),
                DVec3::new(50.0, 0.05, 50.0),
                profile,
            ));
            world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));
            world.apply_impulse(1, DVec3::new(0.05, 0.0, 0.0));
            run(&mut world, 180);
            world.position(1).unwrap().x
        };

        assert!(distance_on(profiles.ice) > distance_on(profiles.sand));
    }

    #[test]
    fn test_set_position_zeroes_velocity() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));
        world.apply_impulse(1, DVec3::new(0.05, 0.0, 0.0));

        assert!(world.set_position(1, DVec3::new(1.0, 0.5, 1.0)));

        assert_eq!(world.position(1), Some(DVec3::new(1.0, 0.5, 1.0)));
        assert_eq!(world.velocity(1), Some(DVec3::ZERO));
        assert!(!world.set_position(99, DVec3::ZERO));
    }

    #[test]
    fn test_wall_reflects_ball() {
        let mut world = world_with_floor();
        world.add_static_geometry(StaticCollider::new(
            DVec3::new(0.5, 0.1, 0.0),
            DVec3::new(0.05, 0.15, 2.0),
            ContactProfiles::default().wall,
        ));
        world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));
        world.apply_impulse(1, DVec3::new(0.1, 0.0, 0.0));

        run(&mut world, 60);

        assert!(world.velocity(1).unwrap().x <= 0.0);
        assert!(world.position(1).unwrap().x < 0.45);
    }

    #[test]
    fn test_rotated_box_contact_uses_orientation() {
        let collider = StaticCollider::new(
            DVec3::ZERO,
            DVec3::new(1.0, 0.05, 0.1),
            ContactProfiles::default().wall,
        )
        .with_euler(DVec3::new(0.0, std::f64::consts::FRAC_PI_2, 0.0));

        assert!(collider.contact(DVec3::new(0.5, 0.0, 0.0), 0.02).is_none());
        assert!(collider.contact(DVec3::new(0.0, 0.0, 0.5), 0.02).is_some());
    }

    #[test]
    fn test_ball_collision_transfers_momentum() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));
        world.add_body(2, DVec3::new(0.3, BALL_RADIUS, 0.0));
        run(&mut world, 30);

        world.apply_impulse(1, DVec3::new(0.05, 0.0, 0.0));
        run(&mut world, 60);

        assert!(world.position(2).unwrap().x > 0.31);
    }

    #[test]
    fn test_step_caps_substeps() {
        let mut world = PhysicsWorld::new(60);
        assert_eq!(world.step(1.0), MAX_SUBSTEPS);
        assert_eq!(world.tick(), u64::from(MAX_SUBSTEPS));

        // The discarded remainder does not carry over.
        assert_eq!(world.step(DT), 1);
    }

    #[test]
    fn test_step_accumulates_small_deltas() {
        let mut world = PhysicsWorld::new(60);
        assert_eq!(world.step(DT * 0.6), 0);
        assert_eq!(world.step(DT * 0.6), 1);
        assert_eq!(world.step(0.0), 0);
        assert_eq!(world.step(f64::NAN), 0);
    }

    #[test]
    fn test_park_freezes_body() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));
        let hidden = DVec3::new(0.0, -10.0, 0.0);

        assert!(world.park(1, hidden));
        run(&mut world, 30);

        assert_eq!(world.position(1), Some(hidden));
        assert!(world.is_at_rest(1));
        assert!(!world.apply_impulse(1, DVec3::X));
    }

    #[test]
    fn test_resting_ball_sleeps_and_impulse_wakes_it() {
        let mut world = world_with_floor();
        world.add_body(1, DVec3::new(0.0, BALL_RADIUS, 0.0));
        run(&mut world, 60);
        assert!(world.is_sleeping(1));

        world.apply_impulse(1, DVec3::new(0.01, 0.0, 0.0));
        assert!(!world.is_sleeping(1));
        assert!(!world.is_at_rest(1));
    }

    #[test]
    fn test_set_radius_rejects_invalid_values() {
        let mut world = PhysicsWorld::new(60);
        world.add_body(1, DVec3::ZERO);

        assert!(world.set_radius(1, 0.06));
        assert_eq!(world.radius(1), Some(0.06));
        assert!(!world.set_radius(1, 0.0));
        assert!(!world.set_radius(1, f64::NAN));
        assert!(!world.set_radius(2, 0.06));
    }

    #[test]
    fn test_bodies_are_kept_in_id_order() {
        let mut world = PhysicsWorld::new(60);
        world.add_body(3, DVec3::ZERO);
        world.add_body(1, DVec3::ZERO);
        world.add_body(2, DVec3::ZERO);
        world.add_body(1, DVec3::X);

        assert_eq!(world.body_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(world.position(1), Some(DVec3::X));
        assert!(world.remove_body(2));
        assert!(!world.remove_body(2));
    }

    #[test]
    fn test_identical_worlds_share_digest() {
        let build = || {
            let mut world = world_with_floor();
            world.add_body(1, DVec3::new(0.0, 0.05, 0.0));
            world.add_body(2, DVec3::new(0.1, 0.05, 0.0));
            world.apply_impulse(1, DVec3::new(0.02, 0.0, 0.01));
            run(&mut world, 90);
            world
        };

        let a = build();
        let b = build();
        assert_eq!(a.state_digest(), b.state_digest());

        let mut c = build();
        c.apply_impulse(2, DVec3::new(0.0, 0.0, 0.01));
        c.step(DT);
        let mut d = build();
        d.step(DT);
        assert_ne!(c.state_digest(), d.state_digest());
    }

    #[test]
    fn test_canonicalize_f64() {
        assert_eq!(canonicalize_f64(-0.0), canonicalize_f64(0.0));
        assert_eq!(canonicalize_f64(f64::NAN), 0x7ff8000000000000);
        assert_eq!(canonicalize_f64(1.5), 1.5f64.to_bits());
    }
}
