use writinglab_core::rules::{default_rules, Trigger};
use writinglab_core::RuleKind;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rules = default_rules();

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    for rule in &rules {
        let kind = match rule.kind {
            RuleKind::Required => "required",
            RuleKind::Optional => "optional",
        };
        println!(
            "{:<11} {:<9} {:<10} {}",
            rule.id,
            kind,
            trigger_label(&rule.trigger),
            rule.title
        );
    }
    Ok(())
}

pub fn trigger_label(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Immediate => "immediate".to_string(),
        Trigger::WordCount { min } => format!("{min}+ words"),
    }
}
