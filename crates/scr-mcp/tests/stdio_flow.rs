use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::{json, Value};

fn data_path(parts: &[&str]) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data");
    for part in parts {
        path = path.join(part);
    }
    path
}

fn spawn_simulator() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_scr-simulatord"))
        .env(
            "SCR_REFERENCE_DATA",
            data_path(&["reference", "historical_portfolio.json"]),
        )
        .env("SCR_COUNTRY_RISK", data_path(&["country_risk", "country_risk.json"]))
        .env("SCR_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn scr-simulatord");

    let stdin = child.stdin.take().expect("stdin");
    let stdout = child.stdout.take().expect("stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_line_json(reader: &mut BufReader<ChildStdout>) -> Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(&line).expect("parse response json")
}

fn write_framed(stdin: &mut ChildStdin, payload: &Value) {
    let body = serde_json::to_vec(payload).expect("serialize payload");
    let frame = format!("Content-Length: {}\r\n\r\n", body.len());
    stdin
        .write_all(frame.as_bytes())
        .expect("write frame header");
    stdin.write_all(&body).expect("write frame body");
    stdin.flush().expect("flush frame");
}

fn read_framed(reader: &mut BufReader<ChildStdout>) -> Value {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read frame header");
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().ok();
            }
        }
    }

    let len = content_length.expect("content-length header");
    let mut body = vec![0_u8; len];
    std::io::Read::read_exact(reader, &mut body).expect("read frame body");
    serde_json::from_slice(&body).expect("parse framed response")
}

#[test]
fn line_delimited_simulation_works() {
    let (mut child, mut stdin, mut reader) = spawn_simulator();

    let req = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": "scr_simulate",
            "arguments": {
                "lead_time_days": 70,
                "distance_km": 2000,
                "bcp_risk": "LOW",
                "country": "Italy"
            }
        }
    });
    writeln!(stdin, "{req}").expect("write request");

    let missing = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {
            "name": "scr_simulate",
            "arguments": {"country": "Italy"}
        }
    });
    writeln!(stdin, "{missing}").expect("write request");
    drop(stdin);

    let response = read_line_json(&mut reader);
    let report = &response["result"]["structuredContent"]["report"];
    assert_eq!(report["strength"], "MEDIUM");
    assert_eq!(report["strength_percentage"], "75.8%");
    assert_eq!(report["target_strength"], "HIGH");

    let response = read_line_json(&mut reader);
    assert_eq!(response["id"], 2);
    assert_eq!(response["result"]["isError"], true);

    let status = child.wait().expect("wait child");
    assert!(status.success());
}

#[test]
fn content_length_initialize_and_tools_list_work() {
    let (mut child, mut stdin, mut reader) = spawn_simulator();

    write_framed(
        &mut stdin,
        &json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "stdio-test", "version": "1.0.0"}
            }
        }),
    );
    let init = read_framed(&mut reader);
    assert_eq!(init["result"]["protocolVersion"].as_str(), Some("2024-11-05"));
    assert_eq!(
        init["result"]["serverInfo"]["name"].as_str(),
        Some("scr-simulatord")
    );

    write_framed(
        &mut stdin,
        &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}}),
    );
    let tools = read_framed(&mut reader);
    let names = tools["result"]["tools"]
        .as_array()
        .expect("tools array")
        .iter()
        .filter_map(|tool| tool.get("name").and_then(Value::as_str))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["scr_simulate", "scr_country_risk", "scr_profile"]);

    drop(stdin);
    let status = child.wait().expect("wait child");
    assert!(status.success());
}

#[test]
fn missing_reference_data_fails_startup() {
    let status = Command::new(env!("CARGO_BIN_EXE_scr-simulatord"))
        .env("SCR_REFERENCE_DATA", "/nonexistent/reference.json")
        .env("SCR_COUNTRY_RISK", data_path(&["country_risk", "country_risk.json"]))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run scr-simulatord");
    assert!(!status.success());
}
