use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use sweep_tone::{Engine, EngineOptions, State, SweepMode};

#[test]
fn test_control_thread_while_rendering() {
    let engine = Arc::new(Engine::new(EngineOptions {
        seed: Some(3),
        ..EngineOptions::default()
    }));
    engine.initialize_audio(100.0, 4000.0, 48000, 2).unwrap();
    engine.start_audio(0).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let control = {
        let engine = engine.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut i = 0_i64;
            while !done.load(Ordering::Relaxed) {
                engine.set_sweep_mode(i % 8).unwrap();
                engine.set_amplitude(0.25 + (i % 4) as f64 * 0.25).unwrap();
                engine.set_sweep_rate(0.5 + (i % 3) as f64).unwrap();
                engine.set_frequency(1000.0 + (i % 10) as f64 * 100.0).unwrap();
                i += 1;
            }
        })
    };

    let mut renderer = engine.renderer();
    let mut buf = vec![0.0_f32; 512 * 2];
    for _ in 0..200 {
        assert_eq!(renderer.render(&mut buf), 512);
        for frame in buf.chunks(2) {
            assert!(frame[0].is_finite());
            assert!(frame[0].abs() <= 1.0 + 1e-6);
            assert_eq!(frame[0], frame[1]);
        }

        let freq = renderer.current_frequency().unwrap();
        assert!((100.0..=4000.0).contains(&freq), "{freq}");
    }

    done.store(true, Ordering::Relaxed);
    control.join().unwrap();
}

#[test]
fn test_stop_from_another_thread() {
    let engine = Arc::new(Engine::default());
    engine.initialize_audio(440.0, 440.0, 44100, 1).unwrap();
    engine.start_audio(0).unwrap();

    let mut renderer = engine.renderer();
    let mut buf = [0.0_f32; 256];
    assert_eq!(renderer.render(&mut buf), 256);

    let stopper = {
        let engine = engine.clone();
        thread::spawn(move || engine.stop_audio())
    };
    stopper.join().unwrap().unwrap();

    assert_eq!(renderer.render(&mut buf), 0);
    assert!(buf.iter().all(|x| *x == 0.0));
    assert_eq!(engine.state(), State::Stopped);
}

#[test]
fn test_timed_session_from_callback_thread() {
    let engine = Arc::new(Engine::default());
    engine.initialize_audio(200.0, 400.0, 8000, 1).unwrap();
    engine.set_sweep_mode(SweepMode::Sawtooth.id() as i64).unwrap();
    engine.start_audio(50).unwrap();

    let mut renderer = engine.renderer();
    let callback = thread::spawn(move || {
        let mut buf = [0.0_f32; 64];
        let mut produced = 0;
        for _ in 0..20 {
            produced += renderer.render(&mut buf);
        }
        produced
    });

    assert_eq!(callback.join().unwrap(), 400);
    assert!(!engine.is_running());
    assert_eq!(engine.state(), State::Stopped);

    // The stopped engine can be played again without reconfiguring
    engine.start_audio(0).unwrap();
    thread::sleep(Duration::from_millis(1));
    assert_eq!(engine.state(), State::Running);
    engine.cleanup_audio();
    assert_eq!(engine.state(), State::Uninitialized);
}
