//! 交互式输入
//!
//! 逐行读取检测目标直到输入 `done`，然后选择轮询间隔。
//! 输入输出都是泛型，测试时可以用内存缓冲区代替终端。

use crate::health::target::is_sentinel;
use crate::health::CheckTarget;
use crate::schedule::PollInterval;
use std::io::{self, BufRead, Write};

/// 行式提示器
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// 创建提示器
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// 收集检测目标
    ///
    /// 非法URL会提示错误并要求重新输入；在至少有一个目标之前 `done` 不会结束输入。
    /// 输入流提前结束时返回已收集到的目标（可能为空）。
    ///
    /// # 返回
    /// * `io::Result<Vec<CheckTarget>>` - 按输入顺序排列的目标
    pub fn collect_targets(&mut self) -> io::Result<Vec<CheckTarget>> {
        writeln!(self.output, "Type \"done\" to proceed")?;
        writeln!(self.output)?;

        let mut targets = Vec::new();
        loop {
            let Some(line) = self.ask("Enter a url to check: ")? else {
                break;
            };

            if line.is_empty() {
                continue;
            }

            if is_sentinel(&line) {
                if targets.is_empty() {
                    writeln!(self.output, "Enter at least one url first")?;
                    continue;
                }
                break;
            }

            match CheckTarget::parse(&line) {
                Ok(target) => targets.push(target),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }

        Ok(targets)
    }

    /// 选择轮询间隔，直接回车使用默认的 1 分钟
    pub fn select_interval(&mut self) -> io::Result<PollInterval> {
        loop {
            let Some(line) =
                self.ask("Check every how many minutes? (1, 5, 10, 15, 30) [1]: ")?
            else {
                return Ok(PollInterval::default());
            };

            if line.is_empty() {
                return Ok(PollInterval::default());
            }

            match line.parse::<PollInterval>() {
                Ok(interval) => return Ok(interval),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    /// 输出提示并读取一行，输入结束时返回 `None`
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// 取回输出，测试中用于检查提示内容
    pub fn into_output(self) -> W {
        self.output
    }
}
