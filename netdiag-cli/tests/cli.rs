use assert_cmd::Command;

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("netdiag").unwrap();
    let output = cmd.arg("--help").output().unwrap();
    assert!(output.status.success());
}

#[test]
fn test_probe_local() {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut cmd = Command::cargo_bin("netdiag").unwrap();
    let assert = cmd
        .args(["probe", "127.0.0.1", &port.to_string()])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["success"], serde_json::Value::Bool(true));
    assert_eq!(value["ip"], "127.0.0.1");
}
