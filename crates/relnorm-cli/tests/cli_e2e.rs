use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const TEXTBOOK: &str = "\
module Textbook
# scenario from the normalization chapter
fd AB -> C
fd C -> A
fd BC -> D
fd ACD -> B
fd D -> EG
fd BE -> C
fd C -> D
fd CE -> G
";

const CHAIN_WITH_RELATIONS: &str = "\
fd A -> B
fd B -> C
relation R1(A, B)
relation R2(B, C)
";

fn relnorm_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_relnorm"))
}

fn run(args: &[&str]) -> Output {
    Command::new(relnorm_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RELNORM_LOG")
        .output()
        .expect("run relnorm")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn write_fixture(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("write fixture");
    path
}

fn json(out: &Output) -> serde_json::Value {
    assert!(out.status.success(), "stderr={}", stderr(out));
    serde_json::from_slice(&out.stdout).expect("stdout is json")
}

#[test]
fn check_prints_a_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "textbook.fd", TEXTBOOK);
    let out = run(&["check", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("ok"), "stdout={text}");
    assert!(text.contains("6 attribute(s), 8 FD(s), 0 relation(s)"), "stdout={text}");

    let summary = json(&run(&["check", path.to_str().unwrap(), "--json"]));
    assert_eq!(summary["module_name"], "Textbook");
    assert_eq!(summary["fds"], 8);
}

#[test]
fn closure_reports_the_closed_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "textbook.fd", TEXTBOOK);
    let result = json(&run(&["closure", path.to_str().unwrap(), "--of", "AB", "--json"]));
    assert_eq!(result["closure"], serde_json::json!(["A", "B", "C", "D", "E", "G"]));
    assert_eq!(result["seed"], serde_json::json!(["A", "B"]));
}

#[test]
fn closure_rejects_unknown_attributes() {
    let out = run(&["closure", "--fds", "A -> B", "--of", "Z"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid input"), "stderr={}", stderr(&out));
}

#[test]
fn keys_and_normal_form_of_the_textbook_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "textbook.fd", TEXTBOOK);

    let search = json(&run(&["keys", path.to_str().unwrap(), "--json"]));
    assert_eq!(
        search["keys"],
        serde_json::json!([["C"], ["A", "B"], ["B", "D"], ["B", "E"]])
    );
    assert_eq!(search["hit_node_cap"], false);

    let out = run(&["normal-form", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Normal form: 1NF"), "stdout={text}");
    assert!(text.contains("partial dependency"), "stdout={text}");
}

#[test]
fn normal_form_from_inline_fds() {
    let report = json(&run(&["normal-form", "--fds", "A->B; B->C; C->D", "--json"]));
    assert_eq!(report["level"], "2NF");
    assert_eq!(report["violation"]["kind"], "transitive_dependency");
}

#[test]
fn cover_lists_the_minimal_cover() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "textbook.fd", TEXTBOOK);
    let cover = json(&run(&["cover", path.to_str().unwrap(), "--json"]));
    assert_eq!(cover["fds"].as_array().map(Vec::len), Some(7));

    let out = run(&["cover", path.to_str().unwrap()]);
    assert!(stdout(&out).contains("Minimal cover:"));
}

#[test]
fn chase_uses_the_module_relations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "chain.fd", CHAIN_WITH_RELATIONS);

    let result = json(&run(&["chase", path.to_str().unwrap(), "--json"]));
    assert_eq!(result["is_lossless"], true);
    assert_eq!(result["lossless_row"], 0);

    let out = run(&["chase", "--fds", "A->B; B->C", "--relations", "AC; BC"]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    assert!(stdout(&out).contains("lossy"), "stdout={}", stdout(&out));
}

#[test]
fn chase_without_relations_is_rejected() {
    let out = run(&["chase", "--fds", "A->B; B->C"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid input"), "stderr={}", stderr(&out));
}

#[test]
fn preserve_reports_lost_dependencies() {
    let report = json(&run(&[
        "preserve",
        "--fds",
        "A -> BC; D -> A",
        "--relations",
        "AD; BD; CD",
        "--json",
    ]));
    assert_eq!(report["all_preserved"], false);
    assert_eq!(report["per_fd"][0]["preserved"], false);
    assert_eq!(report["per_fd"][1]["preserved"], true);
}

#[test]
fn synthesize_writes_to_out() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "textbook.fd", TEXTBOOK);
    let out_path = dir.path().join("synthesis.json");

    let out = run(&[
        "synthesize",
        path.to_str().unwrap(),
        "--json",
        "--out",
        out_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("wrote"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).expect("read out")).expect("json");
    let relations: Vec<serde_json::Value> = written["relations"]
        .as_array()
        .expect("relations")
        .iter()
        .map(|r| r["attributes"].clone())
        .collect();
    assert_eq!(
        relations,
        vec![
            serde_json::json!(["A", "B", "C", "D"]),
            serde_json::json!(["D", "E", "G"]),
            serde_json::json!(["B", "C", "E"]),
        ]
    );
    assert_eq!(written["key_relation_added"], false);
}

#[test]
fn analyze_includes_the_decomposition_when_present() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chain = write_fixture(dir.path(), "chain.fd", CHAIN_WITH_RELATIONS);
    let textbook = write_fixture(dir.path(), "textbook.fd", TEXTBOOK);

    let with = json(&run(&["analyze", chain.to_str().unwrap(), "--json"]));
    assert_eq!(with["decomposition"]["chase"]["is_lossless"], true);
    assert_eq!(with["decomposition"]["preservation"]["all_preserved"], true);
    assert_eq!(with["normal_form"]["level"], "2NF");

    let without = json(&run(&["analyze", textbook.to_str().unwrap(), "--json"]));
    assert!(without.get("decomposition").map_or(true, |d| d.is_null()));

    let out = run(&["analyze", chain.to_str().unwrap()]);
    let text = stdout(&out);
    assert!(text.contains("Candidate keys: A"), "stdout={text}");
    assert!(text.contains("lossless"), "stdout={text}");
}

#[test]
fn reads_stdin_and_formats() {
    let mut child = Command::new(relnorm_bin())
        .args(["fmt", "-"])
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn relnorm");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"# comment\nA, B -> C\nrelation R1(A C)\n")
        .expect("write stdin");
    let out = child.wait_with_output().expect("wait");
    assert!(out.status.success(), "stderr={}", stderr(&out));
    assert_eq!(stdout(&out), "fd AB -> C\nrelation R1(AC)\n");
}

#[test]
fn budget_flags_reach_the_engine() {
    let search = json(&run(&[
        "keys",
        "--fds",
        "A -> B; C -> D",
        "--max-key-nodes",
        "1",
        "--json",
    ]));
    assert_eq!(search["hit_node_cap"], true);

    let cover = json(&run(&[
        "cover",
        "--fds",
        "A -> B; B -> C; A -> C",
        "--redundancy",
        "rhs-collision",
        "--json",
    ]));
    assert_eq!(cover["fds"].as_array().map(Vec::len), Some(2));
}

#[test]
fn capped_normal_form_is_flagged() {
    let report = json(&run(&[
        "normal-form",
        "--fds",
        "AB -> D; B -> C",
        "--max-key-nodes",
        "2",
        "--json",
    ]));
    assert_eq!(report["hit_node_cap"], true);
    assert_eq!(report["level"], "1NF");

    let out = run(&["normal-form", "--fds", "AB -> D; B -> C", "--max-key-nodes", "2"]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("warning:"), "stdout={text}");
    assert!(text.contains("inconclusive"), "stdout={text}");
}
