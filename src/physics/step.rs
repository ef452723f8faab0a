//! The force-directed physics step.
//!
//! One call advances every non-fixed entity by `elapsed` time units in four
//! ordered passes:
//!
//! 1. **Repulsion:** inverse-square push between every ordered pair of
//!    positioned entities whose receiving side is not fixed.
//! 2. **Gravity:** pull toward the configured center point.
//! 3. **Springs:** Hooke's law along every edge around the rest length.
//! 4. **Integration:** clamp speed, advance position, then damp velocity.
//!
//! Later passes read velocities written by earlier ones, so the order is part
//! of the contract. Fixed entities still act as repulsion and spring sources
//! but their own Position and Velocity are never written.
//!
//! The step has no timing state of its own and never fails: coincident or
//! near-coincident points whose force overflows `f32`, and edges with a
//! missing endpoint Position, are skipped.

use crate::ecs::{Entity, ForceSample, World};

use super::config::ForceConfig;

/// Squashes gravity into a usable range for millisecond-scale elapsed times.
pub const GRAVITY_SCALE: f32 = 1e-3;

/// Run one physics step over `world`.
pub fn step(world: &mut World, elapsed: f32, config: &ForceConfig) {
    let World {
        entities,
        position,
        velocity,
        edge,
        fixed,
        debug_repulsion,
        debug_spring,
        debug_gravity,
        ..
    } = world;

    debug_repulsion.clear();
    debug_spring.clear();
    debug_gravity.clear();
    let record = config.record_debug_forces;

    let nodes: Vec<Entity> = entities.live().filter(|&e| position.has(e)).collect();
    let (has_velocity, vx, vy) = velocity.parts_mut();
    let px = position.xs();
    let py = position.ys();

    // =========================================================================
    // 1. Repulsion
    // =========================================================================

    for &a in &nodes {
        if fixed.has(a) {
            continue;
        }
        let ia = a.index();

        for &b in &nodes {
            if a == b {
                continue;
            }
            let ib = b.index();

            let dx = px[ia] - px[ib];
            let dy = py[ia] - py[ib];
            let dist_sq = dx * dx + dy * dy;
            if dist_sq == 0.0 {
                continue;
            }

            let dist = dist_sq.sqrt();
            let force = config.repulsion_strength / dist_sq;
            let fx = (dx / dist) * force;
            let fy = (dy / dist) * force;
            if !fx.is_finite() || !fy.is_finite() {
                continue;
            }

            if has_velocity.contains(a) {
                vx[ia] += fx * elapsed;
                vy[ia] += fy * elapsed;
            }
            if has_velocity.contains(b) && !fixed.has(b) {
                vx[ib] -= fx * elapsed;
                vy[ib] -= fy * elapsed;
            }

            if record {
                debug_repulsion.record(a, ForceSample { source: a, target: b, fx, fy });
                debug_repulsion.record(
                    b,
                    ForceSample { source: b, target: a, fx: -fx, fy: -fy },
                );
            }
        }
    }

    // =========================================================================
    // 2. Gravity toward center
    // =========================================================================

    for &e in &nodes {
        if !has_velocity.contains(e) || fixed.has(e) {
            continue;
        }
        let i = e.index();

        let dx = config.center_x - px[i];
        let dy = config.center_y - py[i];
        let fx = dx * config.gravity_strength * elapsed * GRAVITY_SCALE;
        let fy = dy * config.gravity_strength * elapsed * GRAVITY_SCALE;

        vx[i] += fx;
        vy[i] += fy;

        if record {
            debug_gravity.record(e, ForceSample { source: e, target: e, fx, fy });
        }
    }

    // =========================================================================
    // 3. Springs
    // =========================================================================

    for edge_entity in entities.live() {
        let Some((a, b)) = edge.endpoints(edge_entity) else {
            continue;
        };
        if !position.has(a) || !position.has(b) {
            continue;
        }
        let (ia, ib) = (a.index(), b.index());

        let dx = px[ib] - px[ia];
        let dy = py[ib] - py[ia];
        let dist = (dx * dx + dy * dy).sqrt();
        if dist == 0.0 {
            continue;
        }

        let force = config.spring_stiffness * (dist - config.spring_length);
        let fx = (dx / dist) * force;
        let fy = (dy / dist) * force;
        if !fx.is_finite() || !fy.is_finite() {
            continue;
        }

        if has_velocity.contains(a) && !fixed.has(a) {
            vx[ia] += fx * elapsed;
            vy[ia] += fy * elapsed;
        }
        if has_velocity.contains(b) && !fixed.has(b) {
            vx[ib] -= fx * elapsed;
            vy[ib] -= fy * elapsed;
        }

        if record {
            debug_spring.record(edge_entity, ForceSample { source: a, target: b, fx, fy });
        }
    }

    // =========================================================================
    // 4. Clamp, integrate, damp
    // =========================================================================

    let (_, px, py) = position.parts_mut();

    for &e in &nodes {
        if !has_velocity.contains(e) || fixed.has(e) {
            continue;
        }
        let i = e.index();

        (vx[i], vy[i]) = clamp_speed(vx[i], vy[i], config.max_velocity);

        px[i] += vx[i] * elapsed;
        py[i] += vy[i] * elapsed;

        vx[i] *= config.damping;
        vy[i] *= config.damping;
    }
}

/// Scale a velocity down to at most `max`, keeping its direction.
///
/// Accumulated forces can overflow to infinity: an infinite component then
/// sets the direction on its own, and a velocity with no direction (NaN)
/// comes to rest.
fn clamp_speed(vx: f32, vy: f32, max: f32) -> (f32, f32) {
    if vx.is_nan() || vy.is_nan() {
        return (0.0, 0.0);
    }
    if vx.is_infinite() || vy.is_infinite() {
        let axis = |v: f32| if v.is_infinite() { v.signum() } else { 0.0 };
        let (dx, dy) = (axis(vx), axis(vy));
        let len = dx.hypot(dy);
        return ((dx / len) * max, (dy / len) * max);
    }

    let speed_sq = vx * vx + vy * vy;
    if speed_sq > max * max {
        // Normalize by the larger component so huge speeds cannot overflow
        let largest = vx.abs().max(vy.abs());
        let (ux, uy) = (vx / largest, vy / largest);
        let len = ux.hypot(uy);
        ((ux / len) * max, (uy / len) * max)
    } else {
        (vx, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    /// Config with every force disabled; tests switch on what they need.
    fn quiet() -> ForceConfig {
        ForceConfig {
            repulsion_strength: 0.0,
            spring_length: 50.0,
            spring_stiffness: 0.0,
            damping: 1.0,
            gravity_strength: 0.0,
            max_velocity: 1.0e6,
            center_x: 0.0,
            center_y: 0.0,
            record_debug_forces: true,
        }
    }

    #[test]
    fn test_coincident_points_produce_no_repulsion() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(3.0, 3.0).unwrap();
        let b = world.spawn_node(3.0, 3.0).unwrap();
        let config = ForceConfig {
            repulsion_strength: 1000.0,
            ..quiet()
        };

        step(&mut world, 16.0, &config);

        for e in [a, b] {
            let (vx, vy) = world.velocity.get(e).unwrap();
            assert_eq!((vx, vy), (0.0, 0.0));
            let (x, y) = world.position.get(e).unwrap();
            assert!(x.is_finite() && y.is_finite());
        }
        assert!(world.debug_repulsion.is_empty());
    }

    #[test]
    fn test_repulsion_pushes_apart() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(10.0, 0.0).unwrap();
        let config = ForceConfig {
            repulsion_strength: 100.0,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        // Each ordered pair contributes 100 / 10^2 = 1 to both sides
        let (avx, avy) = world.velocity.get(a).unwrap();
        let (bvx, _) = world.velocity.get(b).unwrap();
        assert!(approx(avx, -2.0), "a.vx = {avx}");
        assert!(approx(avy, 0.0));
        assert!(approx(bvx, 2.0), "b.vx = {bvx}");

        let sample = world.debug_repulsion.get(a).unwrap();
        assert_eq!(sample.source, a);
        assert_eq!(sample.target, b);
        assert!(approx(sample.fx, -1.0));
    }

    #[test]
    fn test_fixed_entity_is_source_but_never_moves() {
        let mut world = World::with_capacity(8);
        let anchor = world.spawn_node(0.0, 0.0).unwrap();
        let free = world.spawn_node(10.0, 0.0).unwrap();
        world.spawn_edge(anchor, free).unwrap();
        world.set_velocity(anchor, 0.5, -0.5).unwrap();
        world.pin(anchor).unwrap();

        let config = ForceConfig {
            repulsion_strength: 100.0,
            spring_stiffness: 0.1,
            gravity_strength: 1.0,
            center_x: 500.0,
            damping: 0.9,
            max_velocity: 5.0,
            ..quiet()
        };

        for _ in 0..50 {
            step(&mut world, 1.0, &config);
        }

        assert_eq!(world.position.get(anchor), Some((0.0, 0.0)));
        assert_eq!(world.velocity.get(anchor), Some((0.5, -0.5)));
        let (x, _) = world.position.get(free).unwrap();
        assert_ne!(x, 10.0);
    }

    #[test]
    fn test_fixed_source_repels_free_entity_once() {
        let mut world = World::with_capacity(8);
        let anchor = world.spawn_node(0.0, 0.0).unwrap();
        let free = world.spawn_node(10.0, 0.0).unwrap();
        world.pin(anchor).unwrap();
        let config = ForceConfig {
            repulsion_strength: 100.0,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        let (vx, _) = world.velocity.get(free).unwrap();
        assert!(approx(vx, 1.0), "vx = {vx}");
        assert_eq!(world.velocity.get(anchor), Some((0.0, 0.0)));
    }

    #[test]
    fn test_velocity_clamped_to_max() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        world.set_velocity(a, 300.0, 400.0).unwrap();
        let config = ForceConfig {
            max_velocity: 5.0,
            ..quiet()
        };

        step(&mut world, 2.0, &config);

        let (vx, vy) = world.velocity.get(a).unwrap();
        assert!(approx((vx * vx + vy * vy).sqrt(), 5.0));
        // Direction preserved, displacement uses the clamped speed
        assert!(approx(vx, 3.0) && approx(vy, 4.0));
        let (x, y) = world.position.get(a).unwrap();
        assert!(approx(x, 6.0) && approx(y, 8.0));
    }

    #[test]
    fn test_clamp_holds_for_many_speeds() {
        let config = ForceConfig {
            max_velocity: 2.5,
            damping: 1.0,
            ..quiet()
        };
        for speed in [0.0_f32, 1.0, 2.5, 3.0, 1.0e3, 1.0e9] {
            let mut world = World::with_capacity(2);
            let a = world.spawn_node(0.0, 0.0).unwrap();
            world.set_velocity(a, speed * 0.6, -speed * 0.8).unwrap();

            step(&mut world, 1.0, &config);

            let (vx, vy) = world.velocity.get(a).unwrap();
            assert!((vx * vx + vy * vy).sqrt() <= 2.5 + EPS, "speed {speed}");
        }
    }

    #[test]
    fn test_clamp_speed_handles_overflow() {
        assert_eq!(clamp_speed(f32::INFINITY, 0.0, 5.0), (5.0, 0.0));
        assert_eq!(clamp_speed(3.0, f32::NEG_INFINITY, 5.0), (0.0, -5.0));
        assert_eq!(clamp_speed(f32::NAN, 1.0, 5.0), (0.0, 0.0));

        let (vx, vy) = clamp_speed(f32::INFINITY, f32::INFINITY, 2.0);
        assert!(approx(vx, 2.0_f32.sqrt()) && approx(vy, 2.0_f32.sqrt()));

        let (vx, vy) = clamp_speed(3.0e38, -3.0e38, 1.0);
        assert!(vx.is_finite() && vy.is_finite());
        assert!(approx((vx * vx + vy * vy).sqrt(), 1.0));
    }

    #[test]
    fn test_near_coincident_points_stay_finite() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(1.0e-20, 0.0).unwrap();
        let c = world.spawn_node(100.0, 0.0).unwrap();
        let config = ForceConfig::default();

        for _ in 0..3 {
            step(&mut world, 16.0, &config);
        }

        for e in [a, b, c] {
            let (x, y) = world.position.get(e).unwrap();
            let (vx, vy) = world.velocity.get(e).unwrap();
            assert!(x.is_finite() && y.is_finite(), "{e} at ({x}, {y})");
            assert!(vx.is_finite() && vy.is_finite(), "{e} moving ({vx}, {vy})");
        }
        // The pair still pushes c away
        let (cx, _) = world.position.get(c).unwrap();
        assert!(cx > 100.0);
    }

    #[test]
    fn test_overflowing_velocity_is_clamped() {
        // 1000 / (3e-18)^2 is finite, but times elapsed it overflows f32
        let mut world = World::with_capacity(4);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(3.0e-18, 0.0).unwrap();
        let config = ForceConfig {
            repulsion_strength: 1000.0,
            max_velocity: 5.0,
            ..quiet()
        };

        step(&mut world, 16.0, &config);

        let (avx, avy) = world.velocity.get(a).unwrap();
        let (bvx, _) = world.velocity.get(b).unwrap();
        assert!(approx(avx, -5.0) && approx(avy, 0.0), "a moving ({avx}, {avy})");
        assert!(approx(bvx, 5.0), "b.vx = {bvx}");
        let (ax, _) = world.position.get(a).unwrap();
        assert!(approx(ax, -80.0), "a.x = {ax}");
    }

    #[test]
    fn test_damping_decays_monotonically() {
        let mut world = World::with_capacity(2);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        world.set_velocity(a, 4.0, 0.0).unwrap();
        let config = ForceConfig {
            damping: 0.85,
            max_velocity: 5.0,
            ..quiet()
        };

        let mut last = 4.0_f32;
        for _ in 0..30 {
            step(&mut world, 1.0, &config);
            let (vx, vy) = world.velocity.get(a).unwrap();
            let speed = (vx * vx + vy * vy).sqrt();
            assert!(speed < last);
            last = speed;
        }
        assert!(last < 0.1);
    }

    #[test]
    fn test_spring_at_rest_length_is_neutral() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(30.0, 40.0).unwrap();
        let e = world.spawn_edge(a, b).unwrap();
        let config = ForceConfig {
            spring_length: 50.0,
            spring_stiffness: 0.5,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        assert_eq!(world.velocity.get(a), Some((0.0, 0.0)));
        assert_eq!(world.velocity.get(b), Some((0.0, 0.0)));
        let sample = world.debug_spring.get(e).unwrap();
        assert_eq!((sample.fx, sample.fy), (0.0, 0.0));
    }

    #[test]
    fn test_compressed_spring_scenario() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(10.0, 0.0).unwrap();
        let e = world.spawn_edge(a, b).unwrap();
        let config = ForceConfig {
            spring_length: 50.0,
            spring_stiffness: 0.1,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        // force = 0.1 * (10 - 50) = -4 along the A->B direction (1, 0):
        // A receives +force, B receives -force.
        let sample = world.debug_spring.get(e).unwrap();
        assert!(approx(sample.fx, -4.0));
        assert!(approx(sample.fy, 0.0));
        assert_eq!((sample.source, sample.target), (a, b));

        let (avx, _) = world.velocity.get(a).unwrap();
        let (bvx, _) = world.velocity.get(b).unwrap();
        assert!(approx(avx, -4.0), "a.vx = {avx}");
        assert!(approx(bvx, 4.0), "b.vx = {bvx}");
    }

    #[test]
    fn test_stretched_spring_pulls_together() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(100.0, 0.0).unwrap();
        world.spawn_edge(a, b).unwrap();
        let config = ForceConfig {
            spring_length: 50.0,
            spring_stiffness: 0.1,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        let (ax, _) = world.position.get(a).unwrap();
        let (bx, _) = world.position.get(b).unwrap();
        assert!(approx(ax, 5.0));
        assert!(approx(bx, 95.0));
    }

    #[test]
    fn test_dangling_edge_is_skipped() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let ghost = world.spawn().unwrap();
        let e = world.spawn_edge(a, ghost).unwrap();
        let beyond = world.spawn_edge(a, Entity(5_000)).unwrap();
        let config = ForceConfig {
            spring_stiffness: 1.0,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        assert_eq!(world.velocity.get(a), Some((0.0, 0.0)));
        assert!(!world.debug_spring.has(e));
        assert!(!world.debug_spring.has(beyond));
    }

    #[test]
    fn test_zero_length_spring_is_harmless() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(1.0, 1.0).unwrap();
        let b = world.spawn_node(1.0, 1.0).unwrap();
        world.spawn_edge(a, b).unwrap();
        let config = ForceConfig {
            spring_stiffness: 1.0,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        assert_eq!(world.velocity.get(a), Some((0.0, 0.0)));
        assert_eq!(world.velocity.get(b), Some((0.0, 0.0)));
    }

    #[test]
    fn test_gravity_scaled_toward_center() {
        let mut world = World::with_capacity(4);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let config = ForceConfig {
            gravity_strength: 2.0,
            center_x: 100.0,
            center_y: -50.0,
            ..quiet()
        };

        step(&mut world, 10.0, &config);

        // 100 * 2 * 10 * 1e-3 = 2, -50 * 2 * 10 * 1e-3 = -1
        let sample = world.debug_gravity.get(a).unwrap();
        assert!(approx(sample.fx, 2.0));
        assert!(approx(sample.fy, -1.0));
        let (vx, vy) = world.velocity.get(a).unwrap();
        assert!(approx(vx, 2.0) && approx(vy, -1.0));
    }

    #[test]
    fn test_entity_without_velocity_is_not_integrated() {
        let mut world = World::with_capacity(4);
        let a = world.spawn().unwrap();
        world.position.add(a, 0.0, 0.0).unwrap();
        let b = world.spawn_node(5.0, 0.0).unwrap();
        let config = ForceConfig {
            repulsion_strength: 25.0,
            gravity_strength: 1.0,
            center_x: 100.0,
            ..quiet()
        };

        step(&mut world, 1.0, &config);

        assert_eq!(world.position.get(a), Some((0.0, 0.0)));
        assert!(!world.debug_gravity.has(a));
        // a still repels b
        let (vx, _) = world.velocity.get(b).unwrap();
        assert!(vx > 0.0);
    }

    #[test]
    fn test_debug_stores_do_not_leak_removed_entities() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(10.0, 0.0).unwrap();
        let config = ForceConfig {
            repulsion_strength: 10.0,
            gravity_strength: 1.0,
            ..quiet()
        };

        step(&mut world, 1.0, &config);
        assert!(world.debug_repulsion.has(b));
        assert!(world.debug_gravity.has(b));

        world.despawn(b);
        step(&mut world, 1.0, &config);

        assert!(!world.debug_repulsion.has(b));
        assert!(!world.debug_gravity.has(b));
        assert!(!world.debug_repulsion.has(a));
        assert!(world.debug_gravity.has(a));
    }

    #[test]
    fn test_debug_recording_can_be_disabled() {
        let mut world = World::with_capacity(8);
        let a = world.spawn_node(0.0, 0.0).unwrap();
        let b = world.spawn_node(10.0, 0.0).unwrap();
        world.spawn_edge(a, b).unwrap();
        let mut config = ForceConfig::default();

        step(&mut world, 1.0, &config);
        assert!(!world.debug_spring.is_empty());

        config.record_debug_forces = false;
        step(&mut world, 1.0, &config);
        assert!(world.debug_repulsion.is_empty());
        assert!(world.debug_spring.is_empty());
        assert!(world.debug_gravity.is_empty());
    }

    #[test]
    fn test_step_is_deterministic() {
        let build = || {
            let mut world = World::with_capacity(32);
            let nodes: Vec<_> = (0..6)
                .map(|i| world.spawn_node(i as f32 * 7.0, (i * i) as f32).unwrap())
                .collect();
            for pair in nodes.windows(2) {
                world.spawn_edge(pair[0], pair[1]).unwrap();
            }
            world
        };
        let config = ForceConfig::default();
        let mut first = build();
        let mut second = build();

        for _ in 0..20 {
            step(&mut first, 16.0, &config);
            step(&mut second, 16.0, &config);
        }

        assert_eq!(first.position.xs(), second.position.xs());
        assert_eq!(first.position.ys(), second.position.ys());
    }
}
