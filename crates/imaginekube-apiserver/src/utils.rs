//! 工具函数

use std::time::Duration;

/// 格式化持续时间为人类可读的字符串
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        return format!("{} 毫秒", millis);
    }

    let seconds = duration.as_secs();
    if seconds < 60 {
        return format!("{}.{} 秒", seconds, duration.subsec_millis() / 100);
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} 分钟 {} 秒", minutes, seconds % 60);
    }

    let hours = minutes / 60;
    format!("{} 小时 {} 分钟", hours, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_millis(250), "250 毫秒")]
    #[case(Duration::from_millis(1500), "1.5 秒")]
    #[case(Duration::from_secs(30), "30.0 秒")]
    #[case(Duration::from_secs(90), "1 分钟 30 秒")]
    #[case(Duration::from_secs(3660), "1 小时 1 分钟")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }
}
