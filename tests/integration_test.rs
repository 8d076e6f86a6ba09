use duckhid::keycodes::{KEY_A, KEY_ENTER, KEY_H, KEY_I, KEY_R, MOD_LEFT_GUI, MOD_LEFT_SHIFT};
use duckhid::parser::script_lines;
use duckhid::{Engine, HidKeyboard, HidReport, Hooks, MemorySink, Outcome};
use std::fs;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn reports_in(bytes: &[u8]) -> Vec<HidReport> {
    assert_eq!(bytes.len() % 8, 0, "device stream is not a whole number of reports");
    bytes
        .chunks(8)
        .map(|chunk| HidReport::from_bytes(chunk).expect("malformed report"))
        .collect()
}

#[tokio::test]
async fn test_script_against_device_file() {
    // A regular file stands in for /dev/hidg0.
    let device = tempfile::NamedTempFile::new().expect("Failed to create device file");
    let script = "\
REM open the run dialog
GUI r
STRING hi
ENTER
";

    let logs = Arc::new(Mutex::new(Vec::new()));
    let logs_in_hook = logs.clone();
    let hooks = Hooks::new().on_log(move |m| logs_in_hook.lock().unwrap().push(m.to_string()));

    let mut engine = Engine::open(device.path()).with_hooks(hooks);
    let result = engine.execute(script).await;

    assert!(result.success, "execution failed: {:?}", result.error);
    assert_eq!(result.lines_executed, 4);
    assert_eq!(*logs.lock().unwrap(), vec!["REM: open the run dialog".to_string()]);

    let reports = reports_in(&fs::read(device.path()).unwrap());
    assert_eq!(
        reports,
        vec![
            HidReport::press(MOD_LEFT_GUI, KEY_R),
            HidReport::release(),
            HidReport::press(0, KEY_H),
            HidReport::release(),
            HidReport::press(0, KEY_I),
            HidReport::release(),
            HidReport::press(0, KEY_ENTER),
            HidReport::release(),
        ]
    );
}

#[tokio::test]
async fn test_raw_and_shift_a_produce_identical_bytes() {
    let raw = MemorySink::new();
    let chord = MemorySink::new();

    Engine::new(HidKeyboard::with_settle(raw.clone(), Duration::ZERO))
        .execute("RAW 0x02 0x04")
        .await;
    Engine::new(HidKeyboard::with_settle(chord.clone(), Duration::ZERO))
        .execute("STRING A")
        .await;

    assert_eq!(raw.bytes(), chord.bytes());
    assert_eq!(&raw.bytes()[..8], &[MOD_LEFT_SHIFT, 0, KEY_A, 0, 0, 0, 0, 0]);
}

#[tokio::test]
async fn test_string_repeat_keystroke_count() {
    let sink = MemorySink::new();
    let result = Engine::new(HidKeyboard::with_settle(sink.clone(), Duration::ZERO))
        .execute("STRING hi\nREPEAT 3")
        .await;
    assert!(result.success);
    let keys: Vec<u8> = sink.presses().iter().map(|r| r.keycode).collect();
    assert_eq!(keys, vec![KEY_H, KEY_I, KEY_H, KEY_I, KEY_H, KEY_I, KEY_H, KEY_I]);
}

#[tokio::test]
async fn test_lines_executed_never_exceeds_total() {
    let scripts = [
        "",
        "STRING a",
        "STRING a\n\n\nENTER\n",
        "REPEAT\nSTRING a",
        "STRING a\nRAW nope\nSTRING b",
        "UNKNOWN\nREM x\r\nTAB",
        "STRING a\rENTER\r",
    ];
    for script in scripts {
        let total = script_lines(script).len();
        let result = Engine::new(HidKeyboard::with_settle(MemorySink::new(), Duration::ZERO))
            .execute(script)
            .await;
        assert!(result.lines_executed <= total, "{script:?}: {result:?}");
        if result.outcome() == Outcome::Completed {
            assert_eq!(result.lines_executed, total, "{script:?}");
        }
    }
}

#[tokio::test]
async fn test_missing_device_fails_first_keystroke() {
    let dir = tempfile::tempdir().unwrap();
    let result = Engine::open(dir.path().join("hidg0"))
        .execute("REM nothing written\nSTRING a\nSTRING b")
        .await;
    assert_eq!(result.outcome(), Outcome::Failed);
    assert_eq!(result.lines_executed, 2);
    assert!(
        result.error.as_deref().unwrap().starts_with("Line 2: "),
        "{:?}",
        result.error
    );
}

#[test]
fn test_check_command_accepts_valid_script() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("ok.txt");
    fs::write(&script_path, "DELAY 100\nSTRING echo test\nENTER\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_duckhid"))
        .arg("check")
        .arg(&script_path)
        .output()
        .expect("Failed to execute duckhid");

    assert!(
        output.status.success(),
        "duckhid failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 lines, 0 warnings"), "got: {stdout}");
}

#[test]
fn test_check_command_flags_unknown_and_bad_raw() {
    let dir = tempfile::tempdir().unwrap();

    let unknown = dir.path().join("unknown.txt");
    fs::write(&unknown, "STRING a\ninvalid_command test\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_duckhid"))
        .arg("check")
        .arg(&unknown)
        .output()
        .expect("Failed to execute duckhid");
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("Line 2: Unknown command: INVALID_COMMAND")
    );

    let bad_raw = dir.path().join("raw.txt");
    fs::write(&bad_raw, "RAW 0x02\n").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_duckhid"))
        .arg("check")
        .arg(&bad_raw)
        .output()
        .expect("Failed to execute duckhid");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Line 1: RAW requires"));
}

#[test]
fn test_run_refuses_missing_device() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("s.txt");
    fs::write(&script_path, "STRING a\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_duckhid"))
        .arg("run")
        .arg(&script_path)
        .arg("--device")
        .arg(dir.path().join("no-such-hidg"))
        .arg("--store")
        .arg(dir.path().join("store.json"))
        .output()
        .expect("Failed to execute duckhid");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not available"));
}

#[test]
fn test_run_writes_reports_to_device() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("s.txt");
    let device = dir.path().join("hidg0");
    fs::write(&script_path, "STRING hi\n").unwrap();
    fs::write(&device, b"").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_duckhid"))
        .arg("run")
        .arg(&script_path)
        .arg("--device")
        .arg(&device)
        .arg("--store")
        .arg(dir.path().join("store.json"))
        .output()
        .expect("Failed to execute duckhid");

    assert!(
        output.status.success(),
        "duckhid failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let reports = reports_in(&fs::read(&device).unwrap());
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0], HidReport::press(0, KEY_H));
    assert_eq!(reports[2], HidReport::press(0, KEY_I));
}
