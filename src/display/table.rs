//! 状态表格渲染
//!
//! `render` 是纯函数：同一个快照总是得到同样的输出

use crate::display::color::{status_style, DIM, TITLE};
use crate::health::CheckResult;
use crate::schedule::Snapshot;
use console::{measure_text_width, pad_str, Alignment};
use tabled::{settings::Style, Table, Tabled};

/// 表格标题
pub const TITLE_TEXT: &str = "TwoHundred";

/// 表格中的一行
#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Url")]
    url: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&CheckResult> for StatusRow {
    fn from(result: &CheckResult) -> Self {
        Self {
            url: result.target.as_str().to_string(),
            status: status_cell(result),
        }
    }
}

/// 渲染一次快照
///
/// 输出依次为：带转圈帧的标题、倒计时或 `checking now`、结果表格。
/// 结果行的顺序与检测目标的输入顺序一致。
///
/// # 参数
/// * `snapshot` - 协调器快照
///
/// # 返回
/// * `String` - 以换行结尾的多行文本
pub fn render(snapshot: &Snapshot) -> String {
    let rows: Vec<StatusRow> = snapshot.cycle.results.iter().map(StatusRow::from).collect();
    let table = Table::new(rows).with(Style::ascii()).to_string();
    let table_width = table.lines().map(measure_text_width).max().unwrap_or(0);

    let frame = snapshot.schedule.spinner_frame();
    let title = format!("{frame} {TITLE_TEXT} {frame}");

    let mut out = String::new();
    out.push_str(&pad_str(
        &TITLE.apply_to(title).to_string(),
        table_width,
        Alignment::Center,
        None,
    ));
    out.push('\n');
    out.push_str(&DIM.apply_to(countdown_line(snapshot)).to_string());
    out.push('\n');
    out.push_str(&table);
    out.push('\n');
    out
}

/// 倒计时行
pub fn countdown_line(snapshot: &Snapshot) -> String {
    if snapshot.schedule.updating {
        "checking now".to_string()
    } else {
        let (minutes, seconds) = snapshot.schedule.countdown_parts();
        format!("Next check in {minutes}m{seconds:02}s")
    }
}

fn status_cell(result: &CheckResult) -> String {
    status_style(result.outcome.band())
        .apply_to(result.outcome.to_string())
        .to_string()
}
