use ruletree::{combine, parse, to_structure, to_text, Record};

fn main() {
    let rules = [
        "age > 30 AND department = 'Sales'",
        "(salary > 50000) OR (experience > 5)",
    ];

    let trees = rules
        .iter()
        .map(|text| parse(text))
        .collect::<Result<Vec<_>, _>>()
        .expect("failed to parse rules");

    for tree in &trees {
        println!("{:>24}: {:?}", to_text(tree), tree.logic_counts());
    }

    let combined = combine(trees).expect("failed to combine rules");
    println!("combined: {}", to_text(&combined));
    println!(
        "{}",
        serde_json::to_string_pretty(&to_structure(&combined).expect("tree too deep"))
            .expect("failed to render structure")
    );

    let record = Record::new()
        .set("age", 35_i64)
        .set("department", "Sales")
        .set("salary", 40000_i64)
        .set("experience", 7_i64);
    println!("{:?}", ruletree::evaluate(&combined, &record));
}
