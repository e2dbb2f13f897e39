use std::process::Command;

fn run_sim(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sim"))
        .args(args)
        .output()
        .expect("failed to run sim")
}

#[test]
fn sim_reports_exactly_one_winner() {
    let output = run_sim(&["1", "2"]);
    assert!(output.status.success(), "sim failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();

    let p1 = v["player1"]["won"].as_bool().unwrap();
    let p2 = v["player2"]["won"].as_bool().unwrap();
    assert_ne!(p1, p2);
    let expected = if p1 { "player1" } else { "player2" };
    assert_eq!(v["winner"], expected);
    assert!(v["player1"]["shots"].as_u64().unwrap() > 0);
}

#[test]
fn sim_is_deterministic_for_fixed_seeds() {
    let a = run_sim(&["7", "8"]);
    let b = run_sim(&["7", "8"]);
    assert!(a.status.success() && b.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn sim_rejects_missing_seeds() {
    let output = run_sim(&["1"]);
    assert!(!output.status.success());
}
