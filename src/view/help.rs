//! Command reference printed by `help`.

/// One row of the command reference.
pub struct HelpEntry {
    /// Usage line.
    pub usage: &'static str,
    /// What the command does.
    pub summary: &'static str,
}

/// All shell commands, in display order.
pub const COMMANDS: &[HelpEntry] = &[
    HelpEntry {
        usage: "analyze [hint...]",
        summary: "run the initial analysis (hint sets the pre comment)",
    },
    HelpEntry {
        usage: "reanalyze [hint...]",
        summary: "re-run analysis (hint sets the post comment)",
    },
    HelpEntry {
        usage: "add NAME [CAL [P [C [F]]]]",
        summary: "add your own ingredient",
    },
    HelpEntry {
        usage: "rm ID",
        summary: "remove an ingredient",
    },
    HelpEntry {
        usage: "set ID field=value...",
        summary: "update name, calories, protein, carbs, fat, fiber, sugar or sodium",
    },
    HelpEntry {
        usage: "note TEXT",
        summary: "set the comment sent with re-analysis",
    },
    HelpEntry {
        usage: "show",
        summary: "print ingredients and totals",
    },
    HelpEntry {
        usage: "submit",
        summary: "save the edited meal",
    },
    HelpEntry {
        usage: "discard",
        summary: "drop the current meal",
    },
    HelpEntry {
        usage: "help",
        summary: "show this list",
    },
    HelpEntry {
        usage: "quit",
        summary: "leave (Ctrl-C cancels a running call)",
    },
];

/// The command reference as aligned text.
pub fn render_help() -> String {
    let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
    let mut out = String::from("Commands:\n");
    for entry in COMMANDS {
        out.push_str(&format!("  {:<width$}  {}\n", entry.usage, entry.summary));
    }
    out
}
