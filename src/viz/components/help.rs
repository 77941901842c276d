use ratatui::{prelude::*, widgets::*};

fn key(name: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::from(name).light_cyan().bold(),
        Span::raw(" : "),
        Span::raw(action),
    ])
}

/// Draw the key bindings of the selected tab in a centered popup
pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let mut lines = vec![
        key("  q  ", "Close the dashboard, training goes on in the background"),
        key("  h  ", "Toggle this help"),
        key(" Tab ", "Switch tabs"),
    ];

    match selected_tab {
        0 => lines.push(key("<- ->", "Switch between the reward and loss curves")),
        _ => lines.extend([
            key("  s  ", "Show or hide the target selector"),
            key("  f  ", "Focus on the selected target"),
            key("Up Dn", "Select a log target"),
            key("<- ->", "Show one level less or more of the selected target"),
            key("- / +", "Capture one level less or more of the selected target"),
            key("PgUp ", "Page back through the history"),
            key("PgDn ", "Page forward, in page mode only"),
            key(" Esc ", "Leave page mode"),
        ]),
    }

    let [_, center_vert, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length((lines.len() + 4) as u16),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(80),
        Constraint::Fill(1),
    ])
    .areas(center_vert);

    Clear.render(center, buf);

    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::horizontal(1))
                .title("Help"),
        )
        .wrap(Wrap { trim: false })
        .render(center, buf);
}
