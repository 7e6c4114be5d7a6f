//! 播放游标
//!
//! 把播放时间映射到稠密时间轴的帧号。`PlaybackState` 由调用方持有，
//! 采样函数不缓存任何东西。

use crate::config::PlaybackConfig;

use super::keyframe::CameraKeyframe;
use super::timeline::{lerp_f32, CameraTimeline};

/// 播放状态
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    /// 当前播放时间（秒），只有下限没有上限
    pub current_time: f64,
    pub playing: bool,
    /// 帧率，默认 30.0
    pub frame_rate: f64,
    /// 播放速度倍率，默认 1.0
    pub speed: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl PlaybackState {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            current_time: 0.0,
            playing: false,
            frame_rate: config.frame_rate,
            speed: config.speed,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// 跳转到指定时间（秒），不改变播放状态
    pub fn seek(&mut self, time: f64) {
        self.current_time = time.max(0.0);
    }

    /// 按帧号跳转
    pub fn seek_frame(&mut self, frame: f64) {
        self.seek(frame / self.frame_rate);
    }

    /// 推进播放时间；暂停时不做任何事
    pub fn advance(&mut self, delta_seconds: f64) {
        if !self.playing {
            return;
        }
        self.current_time += delta_seconds * self.speed;
    }

    /// 当前浮点帧位置（未钳制）
    pub fn frame_position(&self) -> f64 {
        self.current_time * self.frame_rate
    }
}

/// 当前整数帧号，钳制到 `[0, frame_count - 1]`
pub fn frame_index(timeline: &CameraTimeline, state: &PlaybackState) -> usize {
    clamp_frame(state.frame_position().floor(), timeline.frame_count())
}

/// 取当前帧
pub fn sample<'a>(timeline: &'a CameraTimeline, state: &PlaybackState) -> &'a CameraKeyframe {
    timeline.frame_clamped(frame_index(timeline, state))
}

/// 帧间精确采样
///
/// 下一帧为插值帧时按小数部分线性混合；下一帧为原始关键帧或已到末尾时保持当前帧，
/// 避免跨越镜头切换产生过渡。
pub fn sample_precisely(timeline: &CameraTimeline, state: &PlaybackState) -> CameraKeyframe {
    let position = state.frame_position();
    let index = frame_index(timeline, state);
    let current = timeline.frame_clamped(index);

    let amount = (position - index as f64) as f32;
    if !(amount > 0.0 && amount < 1.0) {
        return current.clone();
    }

    match timeline.get(index + 1) {
        Some(next) if !next.is_authored => CameraKeyframe {
            frame_index: current.frame_index,
            distance: lerp_f32(current.distance, next.distance, amount),
            position: current.position.lerp(next.position, amount),
            rotation: current.rotation.lerp(next.rotation, amount),
            field_of_view: lerp_f32(current.field_of_view, next.field_of_view, amount),
            bezier: current.bezier,
            is_authored: false,
        },
        _ => current.clone(),
    }
}

fn clamp_frame(frame: f64, frame_count: usize) -> usize {
    let last = frame_count.saturating_sub(1);
    if frame.is_nan() || frame <= 0.0 {
        0
    } else if frame >= last as f64 {
        last
    } else {
        frame as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::InterpolationMode;
    use glam::Vec3;

    fn timeline() -> CameraTimeline {
        let a = CameraKeyframe::new(0);
        let b = CameraKeyframe {
            position: Vec3::new(30.0, 0.0, 0.0),
            ..CameraKeyframe::new(30)
        };
        let c = CameraKeyframe {
            position: Vec3::new(-5.0, 0.0, 0.0),
            ..CameraKeyframe::new(31)
        };
        CameraTimeline::build(vec![a, b, c], InterpolationMode::Linear).unwrap()
    }

    #[test]
    fn test_sample_bounds() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        assert_eq!(sample(&timeline, &state).frame_index, 0);

        state.seek(1.0e9);
        assert_eq!(sample(&timeline, &state).frame_index, 31);

        state.current_time = -4.0;
        assert_eq!(sample(&timeline, &state).frame_index, 0);

        state.current_time = f64::NAN;
        assert_eq!(sample(&timeline, &state).frame_index, 0);
    }

    #[test]
    fn test_sample_is_pure() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        state.seek(0.5);
        let first = sample(&timeline, &state).clone();
        let second = sample(&timeline, &state).clone();
        assert_eq!(first, second);
        assert_eq!(first.frame_index, 15);
        assert_eq!(sample_precisely(&timeline, &state), sample_precisely(&timeline, &state));
    }

    #[test]
    fn test_seek_and_advance() {
        let mut state = PlaybackState::default();
        state.seek(-3.0);
        assert_eq!(state.current_time, 0.0);

        state.advance(1.0);
        assert_eq!(state.current_time, 0.0);

        state.play();
        state.advance(0.5);
        assert_eq!(state.current_time, 0.5);

        state.seek(2.0);
        assert!(state.playing);
        state.pause();
        state.advance(10.0);
        assert_eq!(state.current_time, 2.0);

        state.seek_frame(45.0);
        assert!((state.current_time - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_seek_back_after_end() {
        let timeline = timeline();
        let mut state = PlaybackState::default();
        state.play();
        state.advance(100.0);
        assert_eq!(sample(&timeline, &state).frame_index, 31);

        state.seek(0.2);
        assert_eq!(sample(&timeline, &state).frame_index, 6);
    }

    #[test]
    fn test_speed_scales_advance() {
        let mut state = PlaybackState::new(&PlaybackConfig {
            frame_rate: 30.0,
            speed: 2.0,
        });
        state.play();
        state.advance(0.25);
        assert_eq!(state.current_time, 0.5);
    }

    #[test]
    fn test_sample_precisely() {
        let timeline = timeline();
        let mut state = PlaybackState::default();

        // 第 10.5 帧：介于两个插值帧之间
        state.seek_frame(10.5);
        let kf = sample_precisely(&timeline, &state);
        assert!((kf.position.x - 10.5).abs() < 1e-4);

        // 第 29.5 帧：下一帧是原始关键帧，保持第 29 帧
        state.seek_frame(29.5);
        let kf = sample_precisely(&timeline, &state);
        assert!((kf.position.x - 29.0).abs() < 1e-4);

        // 第 30.5 帧：下一帧 31 是原始关键帧（镜头切换），不混合
        state.seek_frame(30.5);
        assert_eq!(sample_precisely(&timeline, &state).position.x, 30.0);

        state.seek(1.0e6);
        assert_eq!(sample_precisely(&timeline, &state).frame_index, 31);
    }
}
