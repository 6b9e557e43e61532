//! Snapshot tests for collected items and reports.

use funparam::runner::{self, ConsoleReporter, JsonReporter};
use funparam::{CallOptions, FixtureDef, FunparamError, FunparamResult, Mark, Request, RunOptions, Suite, TestDef};

fn mixed_suite() -> Suite {
    Suite::new()
        .fixture(FixtureDef::new("verify_sum", &["funparam"], |req: &Request| {
            Ok(req.funparam()?.wrap(|(a, b, c): (i32, i32, i32)| assert_eq!(a + b, c, "{a} + {b} != {c}")))
        }))
        .unwrap()
        .fixture(FixtureDef::new("broken", &["funparam"], |_| -> FunparamResult<()> {
            Err(FunparamError::failed("broken fixture"))
        }))
        .unwrap()
        .test(TestDef::new("test_addition", &["verify_sum"], |req: &Request| {
            let verify_sum = req.require::<funparam::Verifier<(i32, i32, i32)>>("verify_sum")?;
            verify_sum.call_with((1, 2, 3), CallOptions::new().id("one and two"));
            verify_sum.call((2, 2, 3));
            verify_sum.call_with((2, 2, 5), CallOptions::new().mark(Mark::skip("later")));
            verify_sum.call_with((0, 0, 1), CallOptions::new().mark(Mark::xfail("known")));
            Ok(())
        }))
        .test(TestDef::new("test_plain", &[], |_| Ok(())).mark(Mark::Slow))
        .test(TestDef::new("test_broken", &["broken"], |_| Ok(())))
}

fn item_listing(suite: &Suite) -> String {
    runner::collect(suite)
        .items
        .iter()
        .map(|item| {
            let marks: Vec<String> = item.marks.iter().map(ToString::to_string).collect();
            format!("{} {:?}", item.name, marks)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn collected_items() {
    insta::assert_snapshot!(item_listing(&mixed_suite()), @r#"
    test_addition[one and two] []
    test_addition[1] []
    test_addition[2] ["skip(\"later\")"]
    test_addition[3] ["xfail(\"known\")"]
    test_plain ["slow"]
    "#);
}

#[test]
fn summary_counts() {
    let mut reporter = ConsoleReporter::with_writer(Vec::new(), false, false);
    let options = RunOptions {
        include_slow: true,
        ..RunOptions::default()
    };
    let summary = runner::run_suite(&mixed_suite(), &options, &mut reporter);
    insta::assert_snapshot!(summary.counts_line(), @"2 passed, 1 failed, 1 skipped, 1 xfailed, 1 error");
}

#[test]
fn verbose_console_report() {
    let mut reporter = ConsoleReporter::with_writer(Vec::new(), true, false);
    let options = RunOptions {
        verbose: true,
        filter: Some("test_addition[1]".into()),
        ..RunOptions::default()
    };
    runner::run_suite(&mixed_suite(), &options, &mut reporter);

    let output = String::from_utf8(reporter.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[1], "collected 1 item / 1 errors");
    assert!(lines[3].starts_with("test_addition[1] FAILED ("), "{}", lines[3]);
    assert!(output.contains("ERROR collecting test_broken"));
    assert!(output.contains("    broken fixture"));
    assert!(output.contains("2 + 2 != 3"));
}

#[test]
fn json_collect_only() {
    let mut reporter = JsonReporter::with_writer(Vec::new());
    let options = RunOptions {
        collect_only: true,
        filter: Some("test_addition".into()),
        ..RunOptions::default()
    };
    runner::run_suite(&mixed_suite(), &options, &mut reporter);

    let output = String::from_utf8(reporter.into_inner()).unwrap();
    let collected: Vec<&str> = output.lines().skip(1).take(4).collect();
    insta::assert_snapshot!(collected.join("\n"), @r#"
    {"event":"collected","marks":[],"name":"test_addition[one and two]"}
    {"event":"collected","marks":[],"name":"test_addition[1]"}
    {"event":"collected","marks":["skip(\"later\")"],"name":"test_addition[2]"}
    {"event":"collected","marks":["xfail(\"known\")"],"name":"test_addition[3]"}
    "#);
}
