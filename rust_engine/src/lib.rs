//! MMD Motion - VMD 相机动作播放核心
//!
//! 提供：
//! - VMD 相机关键帧解析
//! - 关键帧稠密化（线性 / 贝塞尔插值）
//! - 播放游标与按时间采样
//! - 后台姿态计算线程

pub mod animation;
pub mod config;
pub mod player;
pub mod worker;

pub use animation::{
    decode_and_build, BinaryReader, CameraKeyframe, CameraPose, CameraTimeline,
    InterpolationMode, PlaybackState, VmdCameraMotion, VmdHeader,
};
pub use config::{CameraRigConfig, EngineConfig, PlaybackConfig, TimelineConfig, WorkerConfig};
pub use player::MotionPlayer;
pub use worker::{CalculatorWorker, CameraPosePreCalculator, PoseCalculator, WorkerState};

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MmdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("VMD data truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("VMD motion contains no keyframes")]
    Empty,

    #[error("Duplicate keyframe at frame {frame}")]
    DuplicateFrame { frame: u32 },

    #[error("Frame {frame} exceeds the timeline limit of {limit} frames")]
    FrameRangeTooLarge { frame: u32, limit: u32 },

    #[error("Invalid keyframe count: {0}")]
    InvalidCount(i32),

    #[error("Negative frame index: {0}")]
    NegativeFrame(i32),

    #[error("Camera index {index} out of range ({count} cameras loaded)")]
    CameraIndexOutOfRange { index: usize, count: usize },

    #[error("Worker thread did not exit within {timeout:?}")]
    WorkerJoinTimeout { timeout: Duration },

    #[error("Worker has been shut down")]
    WorkerTerminated,
}

/// 解码 / 构建阶段的错误（与 [`MmdError`] 相同）
pub type DecodeError = MmdError;

pub type Result<T> = std::result::Result<T, MmdError>;
