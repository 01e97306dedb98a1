use ruletree::{Record, Rule};

fn main() {
    let rule = Rule::parse("age > 30 AND department = 'Sales'").expect("failed to parse rule");

    println!("{}", rule.text());
    println!("{:#?}", rule.ast());

    // Evaluate against a record
    let record = Record::new()
        .set("age", 35_i64)
        .set("department", "Sales");

    match rule.evaluate(&record) {
        Ok(passed) => println!("Result: {}", if passed { "pass" } else { "fail" }),
        Err(err) => println!("Evaluation failed: {err}"),
    }
}
