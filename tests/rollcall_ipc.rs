use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollcalld");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollcalld");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value.get("error").and_then(|e| e.get("code")).and_then(|v| v.as_str())
}

fn statuses(view: &serde_json::Value) -> Vec<serde_json::Value> {
    view.get("checks")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|c| c.get("absenceType").cloned().unwrap_or(serde_json::Value::Null))
        .collect()
}

fn config() -> serde_json::Value {
    json!({
        "periods": [
            { "name": "3", "absence": ["SICK", "LEAVE"] },
            { "name": "4", "absence": "SICK" },
            { "name": "5" }
        ],
        "absences": [
            { "name": "SICK", "abbr": "S", "color": "#e53935" },
            { "name": "LEAVE", "abbr": "L", "color": "#1e88e5" }
        ],
        "defaultPeriod": "3"
    })
}

#[test]
fn rollcall_open_mark_save_reload_over_ipc() {
    let workspace = temp_dir("rollcalld-ipc-flow");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected.get("configReady").and_then(|v| v.as_bool()), Some(false));

    let not_ready = request(
        &mut stdin,
        &mut reader,
        "2",
        "rollcall.open",
        json!({ "groupType": "class", "groupId": "7a" }),
    );
    assert_eq!(error_code(&not_ready), Some("config_not_ready"));

    let _ = request_ok(&mut stdin, &mut reader, "3", "config.set", json!({ "config": config() }));
    assert!(workspace.join("rollcall.json").is_file());

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.import",
        json!({
            "groupType": "class",
            "groupId": "7a",
            "name": "Class 7A",
            "date": "2024-03-04",
            "students": [
                { "id": "s1", "name": "Ada" },
                { "id": "s2", "name": "Bo",
                  "attendance": { "period": { "period": "3", "absenceType": "SICK" } } },
                { "id": "s3", "name": "Cy",
                  "attendance": { "period": [
                      { "period": "1", "absenceType": "LEAVE" },
                      { "period": "3", "absenceType": "SICK" }
                  ] } },
                { "id": "s4", "name": "Di",
                  "attendance": { "period": { "period": "3", "absenceType": "LEAVE" } } },
                { "id": "s5", "name": "Ed",
                  "attendance": { "period": { "period": "3", "absenceType": "OLD" } } }
            ]
        }),
    );
    assert_eq!(imported.get("imported").and_then(|v| v.as_u64()), Some(5));

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "rollcall.open",
        json!({
            "groupType": "class",
            "groupId": "7a",
            "displayName": "Class 7A",
            "date": "2024-03-04"
        }),
    );
    assert_eq!(view.get("period").and_then(|v| v.as_str()), Some("3"));
    assert_eq!(view.get("summaryText").and_then(|v| v.as_str()), Some("SICK: 2, LEAVE: 1"));
    assert_eq!(view.get("lockedCount").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        statuses(&view),
        vec![json!(null), json!("SICK"), json!("SICK"), json!("LEAVE"), json!("OLD")]
    );
    let first_badge = &view["checks"][0]["badge"];
    assert_eq!(first_badge["text"], json!("Check"));
    assert_eq!(view["checks"][1]["badge"]["background"], json!("#e53935"));

    // No category selected: a transient notice, not a failure.
    let missing = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "rollcall.mark",
        json!({ "studentId": "s1" }),
    );
    assert_eq!(missing.get("applied").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(missing["notices"][0]["kind"], json!("snack"));

    // Locked record: same treatment.
    let locked = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "rollcall.mark",
        json!({ "studentId": "s5", "absenceType": "SICK" }),
    );
    assert_eq!(locked.get("applied").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(locked["view"]["checks"][4]["absenceType"], json!("OLD"));

    // Locked wins over a code the period does not offer.
    let locked_other = request_ok(
        &mut stdin,
        &mut reader,
        "7b",
        "rollcall.mark",
        json!({ "studentId": "s5", "absenceType": "LATE" }),
    );
    assert_eq!(locked_other.get("applied").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(locked_other["notices"][0]["kind"], json!("snack"));

    // A code the period does not offer is refused outright.
    let not_offered = request(
        &mut stdin,
        &mut reader,
        "8",
        "rollcall.mark",
        json!({ "studentId": "s1", "absenceType": "LATE" }),
    );
    assert_eq!(error_code(&not_offered), Some("bad_params"));

    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "rollcall.mark",
        json!({ "studentId": "s1", "absenceType": "LEAVE" }),
    );
    assert_eq!(marked.get("applied").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        marked["view"]["summaryText"],
        json!("LEAVE: 2, SICK: 2")
    );

    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "rollcall.clear",
        json!({ "studentId": "s2" }),
    );
    assert_eq!(cleared.get("applied").and_then(|v| v.as_bool()), Some(true));

    let batch = request_ok(&mut stdin, &mut reader, "11", "rollcall.batch", json!({}));
    let items = batch.get("items").and_then(|v| v.as_array()).cloned().unwrap_or_default();
    assert_eq!(items.len(), 5);
    assert_eq!(items[1], json!({ "studentId": "s2", "absenceType": null }));
    assert_eq!(items[4], json!({ "studentId": "s5", "absenceType": "OLD" }));

    let saved = request_ok(&mut stdin, &mut reader, "12", "rollcall.save", json!({}));
    let expected = vec![json!("LEAVE"), json!(null), json!("SICK"), json!("LEAVE"), json!("OLD")];
    assert_eq!(statuses(&saved["view"]), expected);
    assert_eq!(saved["notices"][0]["kind"], json!("busy"));

    // Saving the same batch again changes nothing.
    let saved_again = request_ok(&mut stdin, &mut reader, "13", "rollcall.save", json!({}));
    assert_eq!(statuses(&saved_again["view"]), expected);

    let reloaded = request_ok(&mut stdin, &mut reader, "14", "rollcall.reload", json!({}));
    assert_eq!(statuses(&reloaded), expected);
    assert_eq!(reloaded["summaryText"], json!("LEAVE: 2, SICK: 1"));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "15",
        "students.list",
        json!({ "groupType": "class", "groupId": "7a", "date": "2024-03-04" }),
    );
    let history = &listed["students"][2]["history"];
    assert_eq!(history.as_array().map(|a| a.len()), Some(2));
}

#[test]
fn rollcall_errors_over_ipc() {
    let workspace = temp_dir("rollcalld-ipc-errors");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let no_ws = request(
        &mut stdin,
        &mut reader,
        "1",
        "rollcall.open",
        json!({ "groupType": "class", "groupId": "7a" }),
    );
    assert_eq!(error_code(&no_ws), Some("no_workspace"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "3", "config.set", json!({ "config": config() }));

    let bad_kind = request(
        &mut stdin,
        &mut reader,
        "4",
        "rollcall.open",
        json!({ "groupType": "school", "groupId": "7a" }),
    );
    assert_eq!(error_code(&bad_kind), Some("bad_params"));

    let unknown_period = request(
        &mut stdin,
        &mut reader,
        "5",
        "rollcall.open",
        json!({ "groupType": "class", "groupId": "7a", "period": "9" }),
    );
    assert_eq!(error_code(&unknown_period), Some("config_error"));

    let unknown_group = request(
        &mut stdin,
        &mut reader,
        "6",
        "rollcall.open",
        json!({ "groupType": "course", "groupId": "missing" }),
    );
    assert_eq!(error_code(&unknown_group), Some("data_fetch_failed"));

    let no_session = request(&mut stdin, &mut reader, "7", "rollcall.save", json!({}));
    assert_eq!(error_code(&no_session), Some("no_session"));

    let bad_date = request(
        &mut stdin,
        &mut reader,
        "8",
        "students.list",
        json!({ "groupType": "class", "groupId": "7a", "date": "03/04/2024" }),
    );
    assert_eq!(error_code(&bad_date), Some("bad_params"));

    let bad_config = request(
        &mut stdin,
        &mut reader,
        "9",
        "config.set",
        json!({ "config": { "periods": [{ "name": "1" }, { "name": "1" }] } }),
    );
    assert_eq!(error_code(&bad_config), Some("config_error"));

    // The previous configuration is still in place.
    let cfg = request_ok(&mut stdin, &mut reader, "10", "config.get", json!({}));
    assert_eq!(cfg["periods"].as_array().map(|a| a.len()), Some(3));
    assert_eq!(cfg["periods"][1]["allowedAbsences"], json!(["SICK"]));
    assert_eq!(cfg["periods"][2]["allowedAbsences"], json!([]));

    let unknown = request(&mut stdin, &mut reader, "11", "rollcall.teleport", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));
}

#[test]
fn config_is_loaded_when_the_workspace_is_reopened() {
    let workspace = temp_dir("rollcalld-ipc-reopen");
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let _ = request_ok(&mut stdin, &mut reader, "2", "config.set", json!({ "config": config() }));
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "groups.create",
            json!({ "groupType": "course", "groupId": "bio-1", "name": "Biology" }),
        );
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected.get("configReady").and_then(|v| v.as_bool()), Some(true));

    let groups = request_ok(&mut stdin, &mut reader, "2", "groups.list", json!({ "groupType": "course" }));
    assert_eq!(groups["groups"][0]["groupId"], json!("bio-1"));
    assert_eq!(groups["groups"][0]["studentCount"], json!(0));

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "rollcall.open",
        json!({ "groupType": "course", "groupId": "bio-1", "period": "4" }),
    );
    assert_eq!(view["checks"].as_array().map(|a| a.len()), Some(0));
    assert_eq!(view["selectableAbsences"], json!(["SICK"]));
    assert_eq!(view["summaryText"], json!(""));
}

#[test]
fn malformed_params_do_not_stop_the_sidecar() {
    let workspace = temp_dir("rollcalld-ipc-malformed");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "1b", "config.set", json!({ "config": config() }));

    for (id, method, params) in [
        ("2", "groups.create", json!(["x"])),
        ("3", "groups.create", json!("x")),
        ("4", "groups.create", json!(7)),
        ("5", "students.create", json!(["x"])),
        ("6", "rollcall.open", json!(["x"])),
    ] {
        let resp = request(&mut stdin, &mut reader, id, method, params);
        assert_eq!(error_code(&resp), Some("bad_params"), "{} {}", method, resp);
    }

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "groups.create",
        json!({ "groupType": "class", "name": "Class 8B" }),
    );
    assert!(created["groupId"].as_str().is_some_and(|id| !id.is_empty()));

    let health = request_ok(&mut stdin, &mut reader, "8", "health", json!({}));
    assert!(health.get("version").is_some());
}
