use colored::*;

pub const TOTAL_WIDTH: usize = 64;

pub fn header(msg: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }

    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: String = format!(
        "{}{}{}",
        "─".repeat(left).bright_black(),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right).bright_black()
    );

    println!("{}", line);
}

pub fn fat_separator() {
    println!("{}", "═".repeat(TOTAL_WIDTH).bright_black());
}

pub fn tree_head(idx: usize, name: &str) {
    println!(
        "{} {}",
        format!("[{}]", idx).bright_black(),
        name.bright_cyan().bold()
    );
}

pub fn tree_line(last: bool, content: &str) {
    let branch = if last { "└─" } else { "├─" };
    println!(" {} {}", branch.bright_black(), content);
}
