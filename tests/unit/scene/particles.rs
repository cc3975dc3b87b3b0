use super::*;
use crate::scene::motion::motion_rng;

const HD: Canvas = Canvas {
    width: 1280,
    height: 720,
};

#[test]
fn count_scales_with_area_with_a_floor() {
    assert_eq!(particle_count(HD), 30);
    assert_eq!(
        particle_count(Canvas {
            width: 64,
            height: 64
        }),
        MIN_PARTICLES
    );
    assert_eq!(
        particle_count(Canvas {
            width: 3840,
            height: 2160
        }),
        276
    );
}

#[test]
fn generated_fields_stay_in_documented_ranges() {
    let particles = create_particles(HD, &mut motion_rng(Some(42)));
    assert_eq!(particles.len(), 30);
    for p in &particles {
        assert!((0.0..1280.0).contains(&p.x));
        assert!((0.0..720.0).contains(&p.y));
        assert!((0.8..=3.0).contains(&p.radius));
        assert!((8.0..=26.0).contains(&p.speed));
        assert!((0.03..=0.12).contains(&p.alpha));
        assert!((0.0..std::f64::consts::TAU).contains(&p.phase));
    }
}

#[test]
fn same_seed_same_field() {
    let a = create_particles(HD, &mut motion_rng(Some(9)));
    let b = create_particles(HD, &mut motion_rng(Some(9)));
    assert_eq!(a, b);
}

#[test]
fn position_drifts_up_and_wraps() {
    let p = Particle {
        x: 100.0,
        y: 10.0,
        radius: 1.0,
        speed: 20.0,
        alpha: 0.1,
        drift: 0.0,
        phase: 0.0,
    };
    let at0 = p.position_at(0.0, HD);
    assert_eq!(at0, Point::new(100.0, 10.0));

    let at_half = p.position_at(0.25, HD);
    assert!((at_half.y - 5.0).abs() < 1e-9);

    // 10px - 20px/s * 1s wraps to the bottom edge
    let wrapped = p.position_at(1.0, HD);
    assert!((wrapped.y - 710.0).abs() < 1e-9);
}

#[test]
fn position_sways_horizontally() {
    let p = Particle {
        x: 0.0,
        y: 100.0,
        radius: 1.0,
        speed: 0.0,
        alpha: 0.1,
        drift: 1.0,
        phase: std::f64::consts::FRAC_PI_2,
    };
    // sin(pi/2) * 1 * 26 = 26
    assert!((p.position_at(0.0, HD).x - 26.0).abs() < 1e-9);
    let later = p.position_at(3.0, HD);
    assert!(later.x >= 0.0 && later.x < 1280.0);
    assert!((later.y - 100.0).abs() < 1e-9);
}

#[test]
fn position_is_a_pure_function_of_time() {
    let particles = create_particles(HD, &mut motion_rng(Some(3)));
    for p in &particles {
        assert_eq!(p.position_at(2.5, HD), p.position_at(2.5, HD));
    }
}
