//! 状态着色
//!
//! 颜色只在终端支持时输出，重定向到文件时自动退化为纯文本

use crate::health::StatusBand;
use console::Style;
use std::sync::LazyLock;

/// 1xx：白底黑字
pub(crate) static INFORMATIONAL: LazyLock<Style> =
    LazyLock::new(|| Style::new().black().on_white());
/// 2xx：绿色
pub(crate) static SUCCESS: LazyLock<Style> = LazyLock::new(|| Style::new().green());
/// 4xx：红色
pub(crate) static CLIENT_ERROR: LazyLock<Style> = LazyLock::new(|| Style::new().red());
/// 其余（含传输失败）：红底黑字
pub(crate) static SERVER_OR_OTHER: LazyLock<Style> =
    LazyLock::new(|| Style::new().black().on_red());

/// 标题
pub(crate) static TITLE: LazyLock<Style> = LazyLock::new(|| Style::new().green().bold());
/// 倒计时等次要信息
pub(crate) static DIM: LazyLock<Style> = LazyLock::new(|| Style::new().dim());

/// 状态分级对应的样式
pub fn status_style(band: StatusBand) -> &'static Style {
    match band {
        StatusBand::Informational => &*INFORMATIONAL,
        StatusBand::Success => &*SUCCESS,
        StatusBand::ClientError => &*CLIENT_ERROR,
        StatusBand::ServerOrOther => &*SERVER_OR_OTHER,
    }
}
