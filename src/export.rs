use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};
use teloxide::types::ChatId;

use crate::errors::PersistenceError;
use crate::registry::{ChannelRegistry, ChatPatch, ChatRecord};
use crate::transport::Transport;

const ACTIVE_FILL: Color = Color::RGB(0xCCFFCC);
const GONE_FILL: Color = Color::RGB(0xFFCCCC);

const HEADER: [&str; 8] = [
    "ID", "Title", "Members", "Videos sent", "Date added", "Membership", "Type", "Link",
];

/// Re-probes every registered chat so stats and exports reflect the current
/// titles and member counts. A chat the probe cannot reach is marked
/// `left`; everything else about it is kept. Runs one probe per chat,
/// sequentially.
pub async fn refresh_all(
    transport: &impl Transport,
    registry: &ChannelRegistry,
) -> Result<(), PersistenceError> {
    let chats = registry.list().await?;

    for chat in &chats {
        let patch = match transport.probe_chat(ChatId(chat.id)).await {
            Ok(probe) => ChatPatch {
                title: Some(probe.title),
                members: Some(probe.members),
                invite_link: probe.username.map(|u| format!("https://t.me/{u}")),
                ..ChatPatch::default()
            },
            Err(e) => {
                log::warn!("probe failed, marking {} as left: {}", chat.id, e);
                ChatPatch::membership("left")
            }
        };

        if let Err(e) = registry.update_fields(chat.id, patch).await {
            log::warn!("could not refresh record {}: {}", chat.id, e);
        }
    }

    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub chats: usize,
    pub members: i64,
    /// Chat count per chat-type tag, e.g. group/supergroup/channel.
    pub by_type: BTreeMap<String, usize>,
}

pub fn compute_stats(chats: &[ChatRecord]) -> Stats {
    let mut stats = Stats {
        chats: chats.len(),
        ..Stats::default()
    };
    for chat in chats {
        stats.members += chat.members;
        *stats.by_type.entry(chat.chat_type.clone()).or_default() += 1;
    }
    stats
}

fn row_fill(membership: &str) -> Color {
    match membership {
        "left" | "kicked" => GONE_FILL,
        _ => ACTIVE_FILL,
    }
}

/// `date_added` is stored as `YYYY-MM-DD HH:MM:SS`; the export drops the
/// seconds. An unparseable value is exported as-is.
fn format_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Renders the registry snapshot as an xlsx workbook in memory. `None` when
/// there is nothing to export.
pub fn export_snapshot(chats: &[ChatRecord]) -> Result<Option<Vec<u8>>, XlsxError> {
    if chats.is_empty() {
        return Ok(None);
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Channels")?;

    for (col, name) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }

    for (i, chat) in chats.iter().enumerate() {
        let row = (i + 1) as u32;
        let fill = Format::new().set_background_color(row_fill(&chat.membership));

        sheet.write_number_with_format(row, 0, chat.id as f64, &fill)?;
        sheet.write_string_with_format(row, 1, &chat.title, &fill)?;
        sheet.write_number_with_format(row, 2, chat.members as f64, &fill)?;
        sheet.write_number_with_format(row, 3, chat.videos_sent as f64, &fill)?;
        sheet.write_string_with_format(row, 4, format_date(&chat.date_added), &fill)?;
        sheet.write_string_with_format(row, 5, &chat.membership, &fill)?;
        sheet.write_string_with_format(row, 6, &chat.chat_type, &fill)?;
        sheet.write_string_with_format(row, 7, &chat.invite_link, &fill)?;
    }

    workbook.save_to_buffer().map(Some)
}
