use super::{border_style, fmt_ts, palette};
use crate::app_state::{App, FocusArea, ViewMode};
use crate::domain::ticket::Assignment;
use crate::domain::vocab::{Priority, RequestType, TicketStatus};
use crate::storage::repository::TicketView;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render_main_view(f: &mut Frame, area: Rect, app: &mut App) {
    match app.view_mode {
        ViewMode::Submit => render_submit(f, area, app),
        ViewMode::Track => render_track(f, area, app),
        ViewMode::Dashboard => render_dashboard(f, area, app),
        ViewMode::Tickets => render_tickets(f, area, app),
        ViewMode::TicketDetail => render_detail(f, area, app),
        ViewMode::MasterData => render_master_data(f, area, app),
        ViewMode::Reports => render_reports(f, area, app),
    }
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

fn failure_line(app: &App) -> Option<Line<'static>> {
    app.failure
        .as_ref()
        .map(|msg| Line::from(Span::styled(format!("✗ {}", msg), Style::default().fg(Color::Red))))
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:<18}", label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn or_dash(v: Option<&str>) -> String {
    match v {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => "-".to_string(),
    }
}

fn status_span(status: TicketStatus) -> Span<'static> {
    Span::styled(
        status.as_str(),
        Style::default()
            .fg(palette(status.color()))
            .add_modifier(Modifier::BOLD),
    )
}

fn priority_text(p: Option<Priority>) -> (String, Color) {
    match p {
        Some(p) => (format!("{} {}", p.emoji(), p.label()), palette(p.color())),
        None => ("-".to_string(), Color::Gray),
    }
}

fn render_submit(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let form = &app.form;
    let dept = form
        .department_id
        .and_then(|id| app.department_name(id))
        .map(str::to_string);
    let area_name = form
        .area_id
        .and_then(|id| app.areas.iter().find(|a| a.id == id))
        .map(|a| format!("{} ({})", a.name, a.code));
    let (prio, prio_color) = priority_text(form.priority);

    let mut lines = vec![
        heading("--- Formulir Permintaan ---"),
        Line::from(""),
        field(
            "Jenis *",
            form.request_type
                .map(|t| t.title().to_string())
                .unwrap_or_else(|| "(belum dipilih)".to_string()),
        ),
        field("Nama pemohon *", or_dash(Some(&form.requester_name))),
        field("Kontak", or_dash(Some(&form.requester_contact))),
        field("Departemen *", or_dash(dept.as_deref())),
        field("Area", or_dash(area_name.as_deref())),
        field("Judul", or_dash(Some(&form.title))),
        field("Deskripsi", or_dash(Some(&form.description))),
        Line::from(vec![
            Span::styled(
                format!("{:<18}", "Prioritas"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(prio, Style::default().fg(prio_color)),
        ]),
        Line::from(""),
        heading(&format!(
            "--- Foto sebelum ({}/{}) ---",
            form.photos.len(),
            app.policy.max_files
        )),
    ];
    for (i, photo) in form.photos.iter().enumerate() {
        lines.push(Line::from(format!(
            "  {}. {} ({} KB)",
            i + 1,
            photo.file_name(),
            photo.size.div_ceil(1024)
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "* wajib diisi. Gunakan /type /name /dept /area /title /desc /prio /photo lalu /submit",
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    )));
    lines.extend(failure_line(app));

    let title = if app.busy {
        "Ajukan Tiket (mengirim...)"
    } else {
        "Ajukan Tiket"
    };
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(border_style(app)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, chunks[0]);

    // choice lists for the form
    let mut options = vec![heading("Jenis permintaan")];
    for t in RequestType::ALL {
        options.push(Line::from(format!("  {:<12} {}", t.as_str(), t.description())));
    }
    options.push(Line::from(""));
    options.push(heading("Prioritas"));
    for p in Priority::ALL {
        options.push(Line::from(vec![
            Span::styled(format!("  {:<12}", p.as_str()), Style::default().fg(palette(p.color()))),
            Span::raw(p.description()),
        ]));
    }
    options.push(Line::from(""));
    match form.department_id {
        Some(_) => {
            options.push(heading("Area"));
            let areas = form.area_options(&app.areas);
            if areas.is_empty() {
                options.push(Line::from("  (tidak ada area)"));
            }
            for a in areas {
                options.push(Line::from(format!("  {:>3} {} {}", a.id, a.code, a.name)));
            }
        }
        None => {
            options.push(heading("Departemen"));
            for d in &app.departments {
                options.push(Line::from(format!("  {:>3} {}", d.id, d.name)));
            }
        }
    }
    let side = Paragraph::new(options).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pilihan")
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(side, chunks[1]);
}

fn ticket_lines(view: &TicketView, full: bool) -> Vec<Line<'static>> {
    let t = &view.ticket;
    let (prio, prio_color) = priority_text(t.priority);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                t.id.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            status_span(t.status),
        ]),
        field("Judul", or_dash(t.title.as_deref())),
        field("Jenis", t.request_type.title().to_string()),
        Line::from(vec![
            Span::styled(
                format!("{:<18}", "Prioritas"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(prio, Style::default().fg(prio_color)),
        ]),
        field("Departemen", or_dash(view.department_name.as_deref())),
        field("Area", or_dash(view.area_name.as_deref())),
        field("Dibuat", fmt_ts(t.created_at)),
    ];
    if full {
        lines.extend([
            field("Pemohon", t.requester_name.clone()),
            field("Kontak", or_dash(t.requester_contact.as_deref())),
            field("Teknisi", or_dash(view.technician_name.as_deref())),
            field("Diperbarui", fmt_ts(t.updated_at)),
            Line::from(""),
            heading("Deskripsi"),
            Line::from(or_dash(t.description.as_deref())),
            Line::from(""),
            heading("Catatan admin"),
            Line::from(or_dash(t.admin_notes.as_deref())),
            heading("Hasil perbaikan"),
            Line::from(or_dash(t.after_description.as_deref())),
            heading("Catatan untuk pemohon"),
            Line::from(or_dash(t.requester_notes.as_deref())),
            Line::from(""),
            heading(&format!("Foto sebelum ({})", t.before_photos.len())),
        ]);
        lines.extend(t.before_photos.iter().map(|p| Line::from(format!("  {}", p))));
        lines.push(heading(&format!("Foto sesudah ({})", t.after_photos.len())));
        lines.extend(t.after_photos.iter().map(|p| Line::from(format!("  {}", p))));
    }
    lines
}

fn render_track(f: &mut Frame, area: Rect, app: &App) {
    let Some(view) = app.track_result.as_ref() else {
        let lines = vec![
            heading("--- Lacak Tiket ---"),
            Line::from(""),
            Line::from("Masukkan nomor tiket atau sebagian judul:"),
            Line::from("  /track TPM-20240115-0042"),
            Line::from("  /track conveyor"),
        ];
        let p = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Lacak Tiket")
                .style(border_style(app)),
        );
        f.render_widget(p, area);
        return;
    };

    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let status = view.ticket.status;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progres"))
        .gauge_style(Style::default().fg(palette(status.color())))
        .percent(status.progress())
        .label(format!("{} ({}%)", status.as_str(), status.progress()));
    f.render_widget(gauge, chunks[0]);

    let title = if app.track_detail {
        "Detail Tiket (Enter ringkas, ↑↓ gulir)"
    } else {
        "Ringkasan Tiket (Enter detail)"
    };
    let p = Paragraph::new(ticket_lines(view, app.track_detail))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(border_style(app)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(p, chunks[1]);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let Some(stats) = app.dashboard.as_ref() else {
        let p = Paragraph::new("Memuat statistik... (r untuk muat ulang)").block(
            Block::default()
                .borders(Borders::ALL)
                .title("Dashboard")
                .style(border_style(app)),
        );
        f.render_widget(p, area);
        return;
    };

    let rows = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Min(0),
        ])
        .split(area);

    let cards = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);
    let avg = stats
        .avg_resolution_hours
        .map(|h| format!("{:.1} jam", h))
        .unwrap_or_else(|| "-".to_string());
    let card_data = [
        ("Total Tiket", stats.total.to_string(), Color::Cyan),
        ("Aktif", stats.active.to_string(), Color::Yellow),
        ("Selesai Hari Ini", stats.closed_today.to_string(), Color::Green),
        ("Rata-rata Selesai", avg, Color::Magenta),
    ];
    for (slot, (label, value, color)) in cards.iter().zip(card_data) {
        let p = Paragraph::new(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(ratatui::layout::Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(label));
        f.render_widget(p, *slot);
    }

    let charts = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let by_status: Vec<(&str, u64)> = stats
        .by_status
        .iter()
        .map(|(s, n)| (s.as_str(), *n))
        .collect();
    let status_chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Per Status"))
        .data(&by_status[..])
        .bar_width(9)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(status_chart, charts[0]);

    let trend_rows: Vec<Row> = stats
        .trend
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.date.format("%d/%m").to_string()),
                Cell::from(d.created.to_string()).style(Style::default().fg(Color::Blue)),
                Cell::from(d.closed.to_string()).style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();
    let trend = Table::new(
        trend_rows,
        [
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Tanggal", "Masuk", "Selesai"]).style(Style::default().fg(Color::Yellow)))
    .block(Block::default().borders(Borders::ALL).title("Tren 7 Hari"));
    f.render_widget(trend, charts[1]);

    let today: Vec<ListItem> = stats
        .today
        .iter()
        .map(|t| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", t.id), Style::default().fg(Color::Cyan)),
                status_span(t.status),
                Span::raw(format!("  {}", or_dash(t.title.as_deref()))),
            ]))
        })
        .collect();
    let list = List::new(today).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Tiket Hari Ini ({})", stats.today.len()))
            .style(border_style(app)),
    );
    f.render_widget(list, rows[2]);
}

fn render_tickets(f: &mut Frame, area: Rect, app: &mut App) {
    let filter = &app.filter;
    let mut title = String::from("Kelola Tiket");
    if let Some(page) = app.ticket_page.as_ref() {
        title.push_str(&format!(
            " [hal {}/{}, {} tiket]",
            page.page, page.total_pages, page.total
        ));
    }
    if !filter.search.trim().is_empty() {
        title.push_str(&format!(" cari: \"{}\"", filter.search));
    }
    if let Some(s) = filter.status {
        title.push_str(&format!(" status: {}", s));
    }
    if let Some(p) = filter.priority {
        title.push_str(&format!(" prioritas: {}", p));
    }
    if app.focus_area == FocusArea::MainView {
        title.push_str(" (Enter buka, n/p halaman)");
    }

    let rows: Vec<Row> = app
        .ticket_page
        .as_ref()
        .map(|p| p.items.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|v| {
            let t = &v.ticket;
            let (prio, prio_color) = priority_text(t.priority);
            Row::new(vec![
                Cell::from(t.id.clone()),
                Cell::from(or_dash(t.title.as_deref())),
                Cell::from(or_dash(v.department_name.as_deref())),
                Cell::from(prio).style(Style::default().fg(prio_color)),
                Cell::from(t.status.as_str()).style(Style::default().fg(palette(t.status.color()))),
                Cell::from(or_dash(v.technician_name.as_deref())),
                Cell::from(fmt_ts(t.created_at)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Min(16),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(16),
        ],
    )
    .header(
        Row::new(vec![
            "Nomor", "Judul", "Departemen", "Prioritas", "Status", "Teknisi", "Dibuat",
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(border_style(app)),
    )
    .highlight_style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol(">> ");

    app.ticket_table_state.select(Some(app.selected_index));
    f.render_stateful_widget(table, area, &mut app.ticket_table_state);
}

fn render_detail(f: &mut Frame, area: Rect, app: &App) {
    let (Some(view), Some(draft)) = (app.detail.as_ref(), app.draft.as_ref()) else {
        let p = Paragraph::new("Belum ada tiket yang dibuka. Gunakan /open <nomor>").block(
            Block::default()
                .borders(Borders::ALL)
                .title("Detail Tiket")
                .style(border_style(app)),
        );
        f.render_widget(p, area);
        return;
    };

    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let p = Paragraph::new(ticket_lines(view, true))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Detail Tiket (↑↓ gulir, x kembali)")
                .style(border_style(app)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(p, chunks[0]);

    let changed = |dirty: bool| {
        if dirty {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        }
    };
    let t = &view.ticket;
    let technician = match draft.assignment {
        Assignment::Unassigned => "(belum ditugaskan)".to_string(),
        Assignment::Technician(id) => app
            .picker
            .iter()
            .find(|tech| tech.id == id)
            .map(|tech| tech.name.clone())
            .or_else(|| view.technician_name.clone())
            .unwrap_or_else(|| format!("#{}", id)),
    };

    let mut lines = vec![heading("--- Perubahan (save untuk simpan) ---")];
    lines.extend(failure_line(app));
    lines.extend([

        Line::from(vec![
            Span::raw(format!("{:<18}", "Status")),
            Span::styled(draft.status.as_str(), changed(draft.status != t.status)),
        ]),
        Line::from(vec![
            Span::raw(format!("{:<18}", "Teknisi")),
            Span::styled(
                technician,
                changed(draft.assignment.to_column() != t.assigned_technician_id),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!("{:<18}", "Catatan admin")),
            Span::styled(
                or_dash(Some(&draft.admin_notes)),
                changed(draft.admin_notes != t.admin_notes.clone().unwrap_or_default()),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!("{:<18}", "Hasil perbaikan")),
            Span::styled(
                or_dash(Some(&draft.after_description)),
                changed(draft.after_description != t.after_description.clone().unwrap_or_default()),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!("{:<18}", "Catatan pemohon")),
            Span::styled(
                or_dash(Some(&draft.requester_notes)),
                changed(draft.requester_notes != t.requester_notes.clone().unwrap_or_default()),
            ),
        ]),
        Line::from(""),
        heading("Status yang tersedia"),
        Line::from(
            TicketStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
        ),
        Line::from(""),
        heading("Teknisi aktif (assign <id>)"),
    ]);
    if app.picker.is_empty() {
        lines.push(Line::from("  (tidak ada teknisi aktif)"));
    }
    for tech in &app.picker {
        lines.push(Line::from(format!("  {:>3} {} ({})", tech.id, tech.name, tech.phone)));
    }

    let title = if app.saving {
        "Editor (menyimpan...)"
    } else {
        "Editor"
    };
    let editor = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(Color::White)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(editor, chunks[1]);
}

fn render_master_data(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Percentage(35),
        ])
        .split(area);

    let depts: Vec<ListItem> = app
        .departments
        .iter()
        .map(|d| ListItem::new(format!("{:>3} {}", d.id, d.name)))
        .collect();
    f.render_widget(
        List::new(depts).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Departemen ({})", app.departments.len()))
                .style(border_style(app)),
        ),
        cols[0],
    );

    let areas: Vec<ListItem> = app
        .areas
        .iter()
        .map(|a| {
            let dept = app.department_name(a.department_id).unwrap_or("?");
            ListItem::new(format!("{:>3} {} {} [{}]", a.id, a.code, a.name, dept))
        })
        .collect();
    f.render_widget(
        List::new(areas).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Area ({})", app.areas.len())),
        ),
        cols[1],
    );

    let techs: Vec<ListItem> = app
        .technicians
        .iter()
        .map(|t| {
            let style = if t.is_active {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mark = if t.is_active { "●" } else { "○" };
            ListItem::new(format!("{:>3} {} {} {}", t.id, mark, t.name, t.phone)).style(style)
        })
        .collect();
    f.render_widget(
        List::new(techs).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Teknisi ({})", app.technicians.len())),
        ),
        cols[2],
    );
}

fn render_reports(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        heading("--- Laporan ---"),
        Line::from(""),
        Line::from("report <jenis> <format> [dari] [sampai] [dept_id]"),
        Line::from(""),
        field("summary", "ringkasan bulanan".to_string()),
        field("detailed", "prioritas per minggu".to_string()),
        field("performance", "kinerja per departemen".to_string()),
        field("trend", "tren per departemen".to_string()),
        Line::from(""),
        field("csv / excel", "file .csv".to_string()),
        field("txt / pdf", "file teks".to_string()),
        Line::from(""),
        Line::from("Tanggal YYYY-MM-DD, - untuk kosong. Contoh:"),
        Line::from("  report summary csv 2024-01-01 2024-03-31"),
        Line::from("  report performance txt - - 3"),
        Line::from(""),
        heading("Departemen"),
    ];
    lines.extend(
        app.departments
            .iter()
            .map(|d| Line::from(format!("  {:>3} {}", d.id, d.name))),
    );
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Laporan")
            .style(border_style(app)),
    );
    f.render_widget(p, area);
}

pub fn render_code_popup(f: &mut Frame, app: &App) {
    let Some(code) = app.ticket_code.as_ref() else {
        return;
    };
    let screen = f.size();
    let width = 44.min(screen.width);
    let height = 21.min(screen.height);
    let popup = Rect::new(
        screen.x + (screen.width - width) / 2,
        screen.y + (screen.height - height) / 2,
        width,
        height,
    );

    let mut lines = vec![
        Line::from(Span::styled(
            code.ticket().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(
        code.render_lines()
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::White).bg(Color::Black)))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from("Esc tutup  t lacak  /qr save simpan"));

    f.render_widget(Clear, popup);
    let p = Paragraph::new(lines)
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tiket Berhasil Dibuat")
                .style(Style::default().fg(Color::Green)),
        );
    f.render_widget(p, popup);
}
