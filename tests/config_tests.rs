use avatar_sync::Config;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn load(file: &NamedTempFile) -> anyhow::Result<Config> {
    Config::load(file.path().to_str().unwrap())
}

#[test]
fn test_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.backend.base_url, "http://localhost:6969");
    assert_eq!(cfg.backend.poll_interval(), Duration::from_millis(500));
    assert!(cfg.backend.max_empty_polls.is_none());
    assert_eq!(cfg.animation.fade_secs, 0.25);
    assert_eq!(cfg.animation.idle_pose, "batterOnDeck");
    assert_eq!(cfg.lipsync.frequency, 5.0);
    assert_eq!(cfg.inactivity.delay(), Duration::from_secs(30));
    assert_eq!(cfg.inactivity.toggle_period(), Duration::from_secs(30));
    assert_eq!(cfg.render.fps, 60);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_lipsync_coefficients_distinct() {
    let coefficients = Config::default().lipsync.coefficients;
    for (i, a) in coefficients.iter().enumerate() {
        for b in &coefficients[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent");
    let cfg = Config::load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.backend.poll_interval_ms, 500);
    assert_eq!(cfg.animation.talking_clip, "talking");
}

#[test]
fn test_load_partial_file() {
    let file = write_config(
        r#"
[backend]
base_url = "http://chat.internal:8080"
max_empty_polls = 20

[inactivity]
delay_secs = 10
"#,
    );

    let cfg = load(&file).unwrap();
    assert_eq!(cfg.backend.base_url, "http://chat.internal:8080");
    assert_eq!(cfg.backend.max_empty_polls, Some(20));
    // Unset keys keep their defaults
    assert_eq!(cfg.backend.poll_interval_ms, 500);
    assert_eq!(cfg.inactivity.delay_secs, 10);
    assert_eq!(cfg.inactivity.toggle_period_secs, 30);
    assert_eq!(cfg.render.fps, 60);
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
[backend]
poll_interval_ms = 250

[animation]
fade_secs = 0.5
clip_dir = "/assets/clips/"
idle_pose = "wave"

[lipsync]
frequency = 8.0
coefficients = [0.9, 0.5, 0.3, 0.2, 0.1]

[render]
fps = 30
"#,
    );

    let cfg = load(&file).unwrap();
    assert_eq!(cfg.backend.poll_interval(), Duration::from_millis(250));
    assert_eq!(cfg.animation.fade_secs, 0.5);
    assert_eq!(cfg.animation.clip_path("wave"), "/assets/clips/wave.fbx");
    assert_eq!(cfg.lipsync.frequency, 8.0);
    assert_eq!(cfg.lipsync.coefficients, [0.9, 0.5, 0.3, 0.2, 0.1]);
    assert_eq!(cfg.render.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
}

#[test]
fn test_rejects_zero_poll_interval() {
    let file = write_config("[backend]\npoll_interval_ms = 0\n");
    let err = load(&file).unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"), "{}", err);
}

#[test]
fn test_rejects_out_of_range_coefficient() {
    let file = write_config("[lipsync]\ncoefficients = [1.0, 0.4, 0.25, 0.2, 0.15]\n");
    let err = load(&file).unwrap_err();
    assert!(err.to_string().contains("coefficients"), "{}", err);
}

#[test]
fn test_rejects_negative_fade() {
    let mut cfg = Config::default();
    cfg.animation.fade_secs = -0.1;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_rejects_zero_toggle_period() {
    let mut cfg = Config::default();
    cfg.inactivity.toggle_period_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_rejects_empty_base_url() {
    let mut cfg = Config::default();
    cfg.backend.base_url = "  ".to_string();
    assert!(cfg.validate().is_err());
}
