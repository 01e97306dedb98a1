use std::sync::Arc;
use std::thread;

use ruletree::{Record, Rule};

fn main() {
    let rule = Arc::new(
        Rule::parse("(age >= 18 AND status = 'active') OR (vip = true)")
            .expect("failed to parse rule"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rule = Arc::clone(&rule);
            thread::spawn(move || {
                let record = Record::new()
                    .set("age", 16_i64 + i64::from(i))
                    .set("status", "active")
                    .set("vip", false);

                let result = rule.evaluate(&record);
                println!("Thread {i}: {result:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
