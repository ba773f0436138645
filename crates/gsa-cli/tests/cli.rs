use assert_cmd::Command;
use predicates::prelude::*;

fn gsa() -> Command {
    Command::cargo_bin("gsa").unwrap()
}

#[test]
fn cases_list_shows_catalog() {
    gsa()
        .args(["cases", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("case9"))
        .stdout(predicate::str::contains("case30"));
}

#[test]
fn cases_show_unknown_name_fails() {
    gsa()
        .args(["cases", "show", "case99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown case"));
}

#[test]
fn pf_runs_on_reference_case() {
    gsa()
        .args(["pf", "--case", "case9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("violations: 0 voltage, 0 overload"));
}

#[test]
fn pf_rejects_bad_init() {
    gsa()
        .args(["pf", "--case", "case9", "--init", "warm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown init strategy"));
}

#[test]
fn opf_dispatches_with_costs() {
    gsa()
        .args([
            "opf",
            "--case",
            "case9",
            "--cost",
            "ext_grid0=30",
            "--cost",
            "gen0=10",
            "--cost",
            "gen1=20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("objective cost"));
}

#[test]
fn nminus1_produces_one_row_per_branch() {
    gsa()
        .args(["nminus1", "--case", "case9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Line 0"))
        .stdout(predicate::str::contains("Line 8"))
        .stdout(predicate::str::contains("/9 outages secure"));
}

#[test]
fn nminus1_dispatch_mode_requires_costs() {
    gsa()
        .args(["nminus1", "--case", "case9", "--dispatch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--cost"));
}
