/// Zero-padded HH:MM:SS. Hours keep growing past 99.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Two-decimal amount, as shown on the meter and in the trip table
pub fn format_money(amount: f64) -> String {
    format!("{amount:.2}")
}
