use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, MULTI_PATH_COMMANDS, NO_ARG_COMMANDS, NUMBER_ARG_COMMANDS, RAW_ARG_COMMANDS,
    REGISTER_COMMAND, SINGLE_PATH_COMMANDS,
};

/// One parsed line of the interactive studio.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub text: Option<String>,
    pub args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            text: None,
            args: BTreeMap::new(),
        }
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    pub fn arg_u64(&self, key: &str) -> Option<u64> {
        self.args.get(key).and_then(Value::as_u64)
    }

    pub fn arg_list(&self, key: &str) -> Vec<String> {
        self.args
            .get(key)
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn find_spec(command: &str, specs: &[CommandSpec]) -> Option<CommandSpec> {
    specs.iter().find(|spec| spec.command == command).copied()
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(spec) = find_spec(&command, RAW_ARG_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                intent
                    .args
                    .insert(spec.key.to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if let Some(spec) = find_spec(&command, NUMBER_ARG_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                let value = arg
                    .trim_end_matches('s')
                    .parse::<u64>()
                    .map(|number| Value::Number(number.into()))
                    .unwrap_or(Value::Null);
                intent.args.insert(spec.key.to_string(), value);
                return intent;
            }

            if let Some(spec) = find_spec(&command, SINGLE_PATH_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                intent.args.insert(
                    spec.key.to_string(),
                    Value::String(parse_single_path_arg(arg)),
                );
                return intent;
            }

            if let Some(spec) = find_spec(&command, MULTI_PATH_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                intent.args.insert(
                    spec.key.to_string(),
                    Value::Array(
                        parse_path_args(arg)
                            .into_iter()
                            .map(Value::String)
                            .collect(),
                    ),
                );
                return intent;
            }

            if command == REGISTER_COMMAND.command {
                let mut intent = Intent::new(REGISTER_COMMAND.action, text);
                intent.args.insert(
                    REGISTER_COMMAND.key.to_string(),
                    Value::Array(
                        parse_path_args(arg)
                            .into_iter()
                            .map(Value::String)
                            .collect(),
                    ),
                );
                return intent;
            }

            if let Some(spec) = find_spec(&command, NO_ARG_COMMANDS) {
                return Intent::new(spec.action, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .args
                .insert("command".to_string(), Value::String(command));
            intent
                .args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("set_text", text);
    intent.text = Some(raw_trimmed.to_string());
    intent
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::parse_intent;

    #[test]
    fn plain_text_sets_primary_input() {
        let intent = parse_intent("  a cozy cafeteria logo  ");
        assert_eq!(intent.action, "set_text");
        assert_eq!(intent.text.as_deref(), Some("a cozy cafeteria logo"));
    }

    #[test]
    fn blank_line_is_noop() {
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn raw_arg_keeps_spaces() {
        let intent = parse_intent("/target Sora (OpenAI)");
        assert_eq!(intent.action, "set_target");
        assert_eq!(intent.arg_str("target"), Some("Sora (OpenAI)"));
    }

    #[test]
    fn duration_accepts_seconds_suffix() {
        let intent = parse_intent("/duration 24s");
        assert_eq!(intent.action, "set_duration");
        assert_eq!(intent.arg_u64("seconds"), Some(24));

        let bad = parse_intent("/continue soon");
        assert_eq!(bad.args["seconds"], Value::Null);
    }

    #[test]
    fn quoted_paths_are_split_with_shell_rules() {
        let intent = parse_intent("/screenshots \"/tmp/a b.png\" /tmp/c.png");
        assert_eq!(intent.action, "attach_screenshots");
        assert_eq!(intent.args["paths"], json!(["/tmp/a b.png", "/tmp/c.png"]));

        let single = parse_intent("/image '/tmp/my photo.jpg'");
        assert_eq!(single.arg_str("path"), Some("/tmp/my photo.jpg"));
    }

    #[test]
    fn register_collects_three_fields() {
        let intent = parse_intent("/register \"Ana Souza\" 5534999990000 ana@example.com");
        assert_eq!(intent.action, "register");
        assert_eq!(
            intent.arg_list("fields"),
            vec!["Ana Souza", "5534999990000", "ana@example.com"]
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        let intent = parse_intent("/teleport now");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.arg_str("command"), Some("teleport"));
        assert_eq!(intent.arg_str("arg"), Some("now"));
    }
}
