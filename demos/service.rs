use ruletree::{MemoryRuleStore, NewCombined, NewRule, RuleService, RuleTreeError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), RuleTreeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let svc = RuleService::new(MemoryRuleStore::new());

    let senior = svc.create(
        NewRule::new("senior sales", "age > 30 AND department = 'Sales'")
            .with_description("older sales staff"),
    )?;
    let paid = svc.create(NewRule::new("paid", "(salary > 50000) OR (experience > 5)"))?;

    // Rejected and logged: the text is already stored.
    if let Err(err) = svc.create(NewRule::new("again", "age > 30 AND department = 'Sales'")) {
        println!("create failed: {err}");
    }

    let both = svc.combine(&[senior.id, paid.id], NewCombined::new("senior and paid"))?;
    println!("{}", serde_json::to_string_pretty(&both)?);

    let body = r#"{"age": 35, "department": "Sales", "salary": 60000, "experience": 3}"#;
    for row in svc.list() {
        println!("{}", svc.evaluate_json(row.id, body)?);
    }

    Ok(())
}
