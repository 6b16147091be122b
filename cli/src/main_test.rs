use super::*;

fn detection(class_name: &str, confidence: f64, bbox: [f64; 4]) -> Detection {
    Detection { class_name: class_name.to_owned(), confidence, bbox }
}

#[test]
fn table_lists_rows_in_given_order() {
    let rows = vec![
        detection("cat", 0.92, [10.0, 20.0, 30.0, 40.0]),
        detection("traffic light", 0.5, [1.5, 2.0, 3.0, 4.0]),
    ];
    let table = render_table(&rows);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("class"));
    assert!(lines[1].contains("cat"));
    assert!(lines[1].contains("92.0%"));
    assert!(lines[1].ends_with("[10,20,30,40]"));
    assert!(lines[2].contains("traffic light"));
    assert!(lines[2].ends_with("[1.5,2,3,4]"));
}

#[test]
fn empty_table_says_so() {
    assert_eq!(render_table(&[]), "no objects detected\n");
}

#[test]
fn empty_question_is_silent() {
    assert!(rejection_message(AskRejection::EmptyQuestion).is_none());
    assert!(rejection_message(AskRejection::Busy).is_some());
}

#[test]
fn cli_parses_analyze_flags() {
    let cli = Cli::try_parse_from([
        "visionchat",
        "analyze",
        "cat.png",
        "--sort",
        "confidence",
        "--desc",
        "--ask",
        "what is this?",
        "--ask",
        "how many?",
    ])
    .unwrap();
    let Command::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    assert_eq!(args.image, PathBuf::from("cat.png"));
    assert_eq!(args.sort.as_deref(), Some("confidence"));
    assert!(args.desc);
    assert_eq!(args.ask, vec!["what is this?", "how many?"]);
}

#[test]
fn cli_desc_requires_sort() {
    assert!(Cli::try_parse_from(["visionchat", "analyze", "cat.png", "--desc"]).is_err());
}
