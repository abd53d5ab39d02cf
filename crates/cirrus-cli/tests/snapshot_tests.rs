//! Snapshot tests for CLI output

use std::process::Command;

fn cirrus(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_cirrus"))
        .args(args)
        .env_remove("CIRRUS_LOG")
        .output()
        .expect("Failed to execute cirrus");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_resources_table() {
    insta::assert_snapshot!(cirrus(&["resources"]), @r"
    TYPE                                SERVICE         NAME              TAGS
    aws_bedrockagent_knowledge_base     bedrockagent    Knowledge Base    yes
    aws_codecommit_repository           codecommit      Repository        yes
    ");
}

#[test]
fn test_help_lists_commands() {
    let help = cirrus(&["--help"]);
    for command in ["validate", "plan", "apply", "import", "destroy", "state", "schema", "resources"] {
        assert!(help.contains(command), "missing {command} in help");
    }
}
