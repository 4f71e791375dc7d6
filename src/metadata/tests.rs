use super::*;
use std::io::Write;

const HEADER: &str = "docid\tauthor\ttitle\trecept\tdate\tpubname\tcanon";

fn spec() -> MetadataSpec {
    MetadataSpec {
        label_column: "recept".to_string(),
        ..MetadataSpec::default()
    }
}

fn table(rows: &[&str], spec: &MetadataSpec) -> MetadataTable {
    let text = std::iter::once(HEADER)
        .chain(rows.iter().copied())
        .collect::<Vec<_>>()
        .join("\n");
    MetadataTable::parse(&text, spec).expect("well-formed table")
}

#[test]
fn test_dirty_pairtree() {
    assert_eq!(dirty_pairtree("uc1.b3342759"), "uc1.b3342759");
    assert_eq!(dirty_pairtree("uc1.$b3=34+27"), "uc1.$b3/34:27");
    // No '=' after the prefix: untouched, even with '+'
    assert_eq!(dirty_pairtree("mdp.a+b"), "mdp.a+b");
    assert_eq!(dirty_pairtree("nodot=x"), "nodot=x");
    assert_eq!(dirty_pairtree("ark.a.b=c"), "ark.a.b/c");
}

#[test]
fn test_force_int() {
    assert_eq!(force_int("1850"), 1850);
    assert_eq!(force_int(" 12 "), 12);
    assert_eq!(force_int("c1850"), 0);
    assert_eq!(force_int(""), 0);
}

#[test]
fn test_basic_load() {
    let t = table(
        &[
            "a.1\tDickinson, Emily\tPoems\telite\t1890\tX\tn",
            "a.2\tWhitman, Walt\tLeaves\tvulgar\t1855\tX\ty",
        ],
        &spec(),
    );
    assert_eq!(t.len(), 2);
    let r = t.get("a.1").expect("present");
    assert_eq!(r.author, "Dickinson, Emily");
    assert_eq!(r.label, "elite");
    assert_eq!(r.date, 1890);
    assert_eq!(r.field("canon"), Some("n"));
}

#[test]
fn test_drop_label_and_filters() {
    let mut spec = spec();
    spec.exclude_if.insert("pubname".into(), "TEM".into());
    spec.exclude_if_not.insert("canon".into(), "n".into());
    spec.exclude_below.insert("date".into(), 1700);
    spec.exclude_above.insert("date".into(), 1950);

    let t = table(
        &[
            "keep\tA\tT\telite\t1800\tX\tn",
            "dropped\tA\tT\tremove\t1800\tX\tn",
            "tem\tA\tT\telite\t1800\tTEM\tn",
            "canon\tA\tT\telite\t1800\tX\ty",
            "early\tA\tT\telite\t1600\tX\tn",
            "late\tA\tT\telite\t1990\tX\tn",
            "undated\tA\tT\telite\tunknown\tX\tn",
        ],
        &spec,
    );
    assert_eq!(t.len(), 1);
    assert!(t.get("keep").is_some());
}

#[test]
fn test_anonymous_authors_are_distinct() {
    let t = table(
        &["x.1\t\tT\telite\t1800\tX\tn", "x.2\t\tT\telite\t1800\tX\tn"],
        &spec(),
    );
    let a = &t.get("x.1").expect("present").author;
    let b = &t.get("x.2").expect("present").author;
    assert!(a.starts_with("anonymous"));
    assert_ne!(a, b);
}

#[test]
fn test_malformed_rows_skipped() {
    let t = table(&["short\tA", "ok\tA\tT\telite\t1800\tX\tn"], &spec());
    assert_eq!(t.len(), 1);
    assert_eq!(t.skipped_rows(), 1);
}

#[test]
fn test_missing_column_is_parse_error() {
    let spec = MetadataSpec {
        label_column: "reviewed".to_string(),
        ..MetadataSpec::default()
    };
    let err = MetadataTable::parse(HEADER, &spec).unwrap_err();
    assert!(matches!(err, AuthorfoldError::Parse { line: 1, .. }));
    assert!(err.to_string().contains("reviewed"));
}

#[test]
fn test_empty_file_rejected() {
    assert!(matches!(
        MetadataTable::parse("", &spec()).unwrap_err(),
        AuthorfoldError::EmptyInput(_)
    ));
}

#[test]
fn test_join_counts_both_directions() {
    let t = table(
        &[
            "uc1.$b=1\tA\tT\telite\t1800\tX\tn",
            "b\tB\tT\telite\t1800\tX\tn",
            "c\tC\tT\telite\t1800\tX\tn",
        ],
        &spec(),
    );
    // Corpus ids arrive in clean form
    let ids = ["uc1.$b=1", "b", "zzz"];
    let (matched, counts) = t.join(&ids);
    assert!(matched[0].is_some());
    assert!(matched[1].is_some());
    assert!(matched[2].is_none());
    assert_eq!(counts.missing_in_metadata, 1);
    assert_eq!(counts.missing_in_corpus, 1);
}

#[test]
fn test_load_reports_path() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "docid\tauthor").expect("write");
    let err = MetadataTable::load(file.path(), &spec()).unwrap_err();
    match err {
        AuthorfoldError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn test_targets() {
    let t = table(
        &["a\tA\tT\telite\t1850\tX\tn", "b\tB\tT\tvulgar\t1870\tX\tn"],
        &spec(),
    );
    let clf = TargetSpec::Classification {
        positive_label: "elite".to_string(),
    };
    assert_eq!(clf.value(t.get("a").expect("present")).expect("label"), 1.0);
    assert_eq!(clf.value(t.get("b").expect("present")).expect("label"), 0.0);

    let reg = TargetSpec::Regression {
        column: "date".to_string(),
        first_column: None,
        first_after: 1750.0,
        expected_range: None,
    };
    assert_eq!(reg.value(t.get("b").expect("present")).expect("numeric"), 1870.0);
    assert!(reg.reads_column("date"));
    assert!(!reg.reads_column("firstpub"));
    let bad = TargetSpec::Regression {
        column: "pubname".to_string(),
        first_column: None,
        first_after: 1750.0,
        expected_range: None,
    };
    assert!(bad.value(t.get("a").expect("present")).is_err());

    // Earlier first-publication date replaces the date only when it is
    // earlier and after the threshold
    let text = [
        format!("{HEADER}\tfirstpub"),
        "early\tA\tT\telite\t1850\tX\tn\t1820".to_string(),
        "later\tB\tT\telite\t1850\tX\tn\t1860".to_string(),
        "ancient\tC\tT\telite\t1850\tX\tn\t1700".to_string(),
        "blank\tD\tT\telite\t1850\tX\tn\t".to_string(),
    ]
    .join("\n");
    let t = MetadataTable::parse(&text, &spec()).expect("well-formed table");
    let dated = TargetSpec::Regression {
        column: "date".to_string(),
        first_column: Some("firstpub".to_string()),
        first_after: 1750.0,
        expected_range: Some([1700.0, 1925.0]),
    };
    assert!(dated.reads_column("firstpub"));
    let value = |id: &str| dated.value(t.get(id).expect("present")).expect("numeric");
    assert_eq!(value("early"), 1820.0);
    assert_eq!(value("later"), 1850.0);
    assert_eq!(value("ancient"), 1850.0);
    assert_eq!(value("blank"), 1850.0);
}

#[test]
fn test_never_train() {
    let t = table(
        &[
            "a\tA\tT\taddcanon\t1850\tX\tn",
            "b\tB\tT\telite\t1960\tX\tn",
            "c\tC\tT\telite\t1900\tX\tn",
        ],
        &spec(),
    );
    let mut never = NeverTrain::default();
    never.if_equals.insert("recept".into(), "addcanon".into());
    never.above.insert("date".into(), 1950);

    let records: Vec<&MetadataRecord> =
        ["a", "b", "c"].iter().map(|id| t.get(id).expect("present")).collect();
    assert_eq!(never.banned_indices(&records), vec![0, 1]);
}

#[test]
fn test_size_cap_mask() {
    let classes = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
    let keep = size_cap_mask(&classes, 2, 7);
    assert_eq!(keep[..4].iter().filter(|k| **k).count(), 2);
    assert_eq!(&keep[4..], &[true, true]);

    // Seeded: same mask every time
    assert_eq!(keep, size_cap_mask(&classes, 2, 7));
    // Zero disables the cap
    assert!(size_cap_mask(&classes, 0, 7).iter().all(|k| *k));
}
