// tests for man page generation

use clap::CommandFactory;
use clap_mangen::Man;
use control_conditions::cli::Cli;

#[test]
fn test_man_page_renders() {
    let man = Man::new(Cli::command());

    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let content = String::from_utf8(buffer).expect("man page should be UTF-8");
    assert!(content.contains("ctlcond"));
    assert!(content.contains("check"));
    assert!(content.contains("explain"));
}
