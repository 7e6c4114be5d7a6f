//! 相机时间轴 - 关键帧稠密化
//!
//! 把稀疏的关键帧展开为每个整数帧一项的数组，播放时直接按帧号取值。

use glam::Vec3;

use crate::config::TimelineConfig;
use crate::{MmdError, Result};

use super::keyframe::CameraKeyframe;
use super::vmd_loader;

/// 关键帧之间的插值方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// 匀速线性插值
    Linear,
    /// 使用关键帧自带的贝塞尔曲线
    #[default]
    Bezier,
}

/// 同一帧出现多个关键帧时的处理
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DuplicateFramePolicy {
    /// 返回 [`MmdError::DuplicateFrame`]
    #[default]
    Reject,
    /// 保留文件中靠后的关键帧
    KeepLast,
}

/// 单个插值帧各通道的混合系数
#[derive(Clone, Copy, Debug)]
struct ChannelBlend {
    x: f32,
    y: f32,
    z: f32,
    angle: f32,
    distance: f32,
    fov: f32,
}

impl ChannelBlend {
    fn uniform(amount: f32) -> Self {
        Self {
            x: amount,
            y: amount,
            z: amount,
            angle: amount,
            distance: amount,
            fov: amount,
        }
    }
}

/// 稠密相机时间轴（只读，重新加载时整体替换）
#[derive(Clone, Debug)]
pub struct CameraTimeline {
    frames: Vec<CameraKeyframe>,
    frame_count: usize,
}

impl CameraTimeline {
    /// 使用默认配置和指定插值方式构建
    pub fn build(keyframes: Vec<CameraKeyframe>, mode: InterpolationMode) -> Result<Self> {
        let config = TimelineConfig {
            interpolation: mode,
            ..TimelineConfig::default()
        };
        Self::build_with_config(keyframes, &config)
    }

    /// 排序、去重检查并稠密化
    pub fn build_with_config(mut keyframes: Vec<CameraKeyframe>, config: &TimelineConfig) -> Result<Self> {
        // 稳定排序，KeepLast 依赖文件中的先后顺序
        keyframes.sort_by_key(|kf| kf.frame_index);
        resolve_duplicates(&mut keyframes, config.duplicate_policy)?;

        let (first, last) = match (keyframes.first(), keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(MmdError::Empty),
        };

        let max_frame = last.frame_index;
        let frame_count = max_frame as u64 + 1;
        if frame_count > config.max_frame_count as u64 {
            return Err(MmdError::FrameRangeTooLarge {
                frame: max_frame,
                limit: config.max_frame_count,
            });
        }

        let mut frames = Vec::with_capacity(frame_count as usize);

        // 第一个关键帧之前的帧保持第一个关键帧的值
        for slot in 0..first.frame_index {
            frames.push(CameraKeyframe {
                frame_index: slot,
                is_authored: false,
                ..first.clone()
            });
        }
        frames.push(authored(first));

        for pair in keyframes.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let gap = next.frame_index - prev.frame_index;
            for j in 1..gap {
                let blend = segment_blend(next, j, gap, config.interpolation);
                frames.push(interpolate(prev, next, prev.frame_index + j, blend));
            }
            frames.push(authored(next));
        }

        debug_assert_eq!(frames.len() as u64, frame_count);
        log::debug!(
            "相机时间轴构建完成: {} 个关键帧 -> {} 帧 ({:?})",
            keyframes.len(),
            frames.len(),
            config.interpolation
        );

        Ok(Self {
            frame_count: frames.len(),
            frames,
        })
    }

    /// 总帧数（最大帧号 + 1）
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// 最大帧号
    pub fn max_frame_index(&self) -> u32 {
        (self.frame_count - 1) as u32
    }

    /// 获取指定帧
    pub fn get(&self, frame: usize) -> Option<&CameraKeyframe> {
        self.frames.get(frame)
    }

    /// 按范围钳制后取帧
    pub fn frame_clamped(&self, frame: usize) -> &CameraKeyframe {
        &self.frames[frame.min(self.frame_count - 1)]
    }

    pub fn frames(&self) -> &[CameraKeyframe] {
        &self.frames
    }

    /// 原始关键帧数量
    pub fn authored_count(&self) -> usize {
        self.frames.iter().filter(|kf| kf.is_authored).count()
    }
}

/// 解析 VMD 字节并构建时间轴
pub fn decode_and_build(bytes: &[u8], mode: InterpolationMode) -> Result<CameraTimeline> {
    CameraTimeline::build(vmd_loader::decode(bytes)?, mode)
}

fn resolve_duplicates(keyframes: &mut Vec<CameraKeyframe>, policy: DuplicateFramePolicy) -> Result<()> {
    match policy {
        DuplicateFramePolicy::Reject => {
            if let Some(pair) = keyframes.windows(2).find(|p| p[0].frame_index == p[1].frame_index) {
                return Err(MmdError::DuplicateFrame {
                    frame: pair[0].frame_index,
                });
            }
        }
        DuplicateFramePolicy::KeepLast => {
            let before = keyframes.len();
            keyframes.dedup_by(|later, kept| {
                if later.frame_index == kept.frame_index {
                    std::mem::swap(later, kept);
                    true
                } else {
                    false
                }
            });
            if keyframes.len() != before {
                log::debug!("丢弃 {} 个重复帧的关键帧", before - keyframes.len());
            }
        }
    }
    Ok(())
}

fn authored(keyframe: &CameraKeyframe) -> CameraKeyframe {
    CameraKeyframe {
        is_authored: true,
        ..keyframe.clone()
    }
}

/// 区间 (prev, next) 内第 j 帧的混合系数；贝塞尔曲线取自 next
fn segment_blend(next: &CameraKeyframe, j: u32, gap: u32, mode: InterpolationMode) -> ChannelBlend {
    let t = j as f32 / gap as f32;
    match mode {
        InterpolationMode::Linear => ChannelBlend::uniform(t),
        InterpolationMode::Bezier => {
            let curves = next.interpolation();
            ChannelBlend {
                x: curves.lookat_x.evaluate(t),
                y: curves.lookat_y.evaluate(t),
                z: curves.lookat_z.evaluate(t),
                angle: curves.angle.evaluate(t),
                distance: curves.distance.evaluate(t),
                fov: curves.fov.evaluate(t),
            }
        }
    }
}

fn interpolate(prev: &CameraKeyframe, next: &CameraKeyframe, frame_index: u32, blend: ChannelBlend) -> CameraKeyframe {
    CameraKeyframe {
        frame_index,
        distance: lerp_f32(prev.distance, next.distance, blend.distance),
        position: Vec3::new(
            lerp_f32(prev.position.x, next.position.x, blend.x),
            lerp_f32(prev.position.y, next.position.y, blend.y),
            lerp_f32(prev.position.z, next.position.z, blend.z),
        ),
        rotation: prev.rotation + (next.rotation - prev.rotation) * blend.angle,
        field_of_view: lerp_f32(prev.field_of_view, next.field_of_view, blend.fov),
        bezier: next.bezier,
        is_authored: false,
    }
}

pub(crate) fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
