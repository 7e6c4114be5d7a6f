//! 动画系统
//!
//! 提供 VMD 相机动作解析、关键帧稠密化、播放采样等功能。

mod bezier;
mod binary_reader;
mod camera_pose;
mod keyframe;
mod playback;
mod timeline;
pub(crate) mod vmd_loader;

pub use bezier::BezierCurve;
pub use binary_reader::BinaryReader;
pub use camera_pose::CameraPose;
pub use keyframe::{CameraInterpolation, CameraKeyframe, CAMERA_BEZIER_LEN};
pub use playback::{frame_index, sample, sample_precisely, PlaybackState};
pub use timeline::{decode_and_build, CameraTimeline, DuplicateFramePolicy, InterpolationMode};
pub use vmd_loader::{decode, VmdCameraMotion, VmdHeader, CAMERA_KEYFRAME_LEN, HEADER_LEN};
