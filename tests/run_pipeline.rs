//! End-to-end tests driving the compiled binary with a canned LM command.

use std::process::Command;

fn mock_lm_command() -> String {
    format!("sh {}/tests/mock_lm.sh", env!("CARGO_MANIFEST_DIR"))
}

fn run_postgen(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_postgen"))
        .args(args)
        .output()
        .expect("run postgen")
}

#[test]
fn test_run_generates_three_posts_in_selection_order() {
    let lm = mock_lm_command();
    let output = run_postgen(&["run", "--topic", "dune part three", "--lm", &lm]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse posts payload");

    let posts = payload["posts"].as_array().expect("posts array");
    assert_eq!(posts.len(), 3);

    // The mock picks "2, 4, 1"; posts follow selection order, not list order.
    let topics: Vec<&str> = posts
        .iter()
        .map(|post| post["topic"].as_str().unwrap())
        .collect();
    assert_eq!(topics, vec!["Desert Shoot", "Sandworm VFX", "Casting News"]);

    assert_eq!(posts[0]["title"], "Final: Desert Shoot");
    assert_eq!(posts[0]["draft"], "Draft about Desert Shoot.");
    assert_eq!(posts[0]["final"], "Polished post about Desert Shoot.");
    assert_eq!(
        posts[0]["sources"],
        serde_json::json!([
            "https://shoot.example/two",
            "https://supplement.example/extra"
        ])
    );
    assert_eq!(posts[0]["seo_title"], "SEO: Desert Shoot");
    assert_eq!(posts[0]["seo_description"], "All about Desert Shoot.");

    assert_eq!(posts[2]["sources"][0], "https://casting.example/one");
}

#[test]
fn test_empty_topic_is_rejected_at_the_boundary() {
    let lm = mock_lm_command();
    let output = run_postgen(&["run", "--topic", "   ", "--lm", &lm]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_overlong_topic_is_rejected_at_the_boundary() {
    let lm = mock_lm_command();
    let topic = "x".repeat(201);
    let output = run_postgen(&["run", "--topic", &topic, "--lm", &lm]);
    assert_eq!(output.status.code(), Some(2));
}
