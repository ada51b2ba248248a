use chrono::NaiveDate;

/// Render the push message for a bin-full notification.
pub fn render_message(target_date: NaiveDate) -> String {
    format!(
        "🗑️ The trash bin is full!\nThe next collection day is {} ({}).\nPlease get it ready.",
        target_date.format("%Y-%m-%d"),
        target_date.format("%a"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_message_includes_date_and_weekday() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let message = render_message(date);
        assert!(message.contains("2025-01-06"));
        assert!(message.contains("(Mon)"));
        assert!(message.starts_with("🗑️"));
    }
}
