pub struct Config {
    /// Quiet level. 0 prints everything, 1 drops decorations,
    /// 2 keeps only the result summary.
    pub quiet: u8,

    /// Disables ANSI colors in terminal output.
    pub no_color: bool,
}
