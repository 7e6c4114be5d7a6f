//! VMD 相机动作解析
//!
//! 文件布局：
//!   签名 (30B) + 模型名 (20B)
//!   骨骼关键帧数 (u32) + 骨骼关键帧 (111B/帧)
//!   Morph 关键帧数 (u32) + Morph 关键帧 (23B/帧)
//!   相机关键帧数 (i32) + 相机关键帧 (61B/帧)
//!
//! 相机动作文件中骨骼与 Morph 数量均为 0。本模块不做排序，排序交给时间轴构建。

use std::f32::consts::PI;

use glam::Vec3;

use crate::{MmdError, Result};

use super::binary_reader::BinaryReader;
use super::keyframe::{CameraKeyframe, CAMERA_BEZIER_LEN};

/// VMD 文件头
const VMD_HEADER_V1: &[u8] = b"Vocaloid Motion Data file";
const VMD_HEADER_V2: &[u8] = b"Vocaloid Motion Data 0002";

pub const SIGNATURE_LEN: usize = 30;
pub const MODEL_NAME_LEN: usize = 20;
pub const HEADER_LEN: usize = SIGNATURE_LEN + MODEL_NAME_LEN;

const BONE_KEYFRAME_LEN: usize = 111;
const MORPH_KEYFRAME_LEN: usize = 23;
/// frame(4) + distance(4) + position(12) + rotation(12) + bezier(24) + fov(4) + padding(1)
pub const CAMERA_KEYFRAME_LEN: usize = 61;

/// VMD 文件头
#[derive(Clone, Debug, PartialEq)]
pub struct VmdHeader {
    pub signature: [u8; SIGNATURE_LEN],
    pub model_name: String,
}

impl VmdHeader {
    /// 签名是否为已知的 VMD 版本
    pub fn is_recognized(&self) -> bool {
        let head = &self.signature[..VMD_HEADER_V1.len()];
        head == VMD_HEADER_V1 || head == VMD_HEADER_V2
    }
}

/// 解析后的相机动作（未排序）
#[derive(Clone, Debug)]
pub struct VmdCameraMotion {
    pub header: VmdHeader,
    pub keyframes: Vec<CameraKeyframe>,
}

impl VmdCameraMotion {
    /// 从字节解析
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let header = read_header(&mut reader)?;
        if !header.is_recognized() {
            log::warn!(
                "Unrecognized VMD signature {:?}, decoding anyway",
                String::from_utf8_lossy(&header.signature)
            );
        }

        skip_section(&mut reader, BONE_KEYFRAME_LEN)?;
        skip_section(&mut reader, MORPH_KEYFRAME_LEN)?;

        let count = reader.read_i32()?;
        if count < 0 {
            return Err(MmdError::InvalidCount(count));
        }
        let count = count as usize;

        // 先检查总长度，避免按损坏的数量分配内存
        reader.ensure(count.saturating_mul(CAMERA_KEYFRAME_LEN))?;

        let mut keyframes = Vec::with_capacity(count);
        for _ in 0..count {
            keyframes.push(read_camera_keyframe(&mut reader)?);
        }

        log::debug!(
            "VMD 相机动作解析完成: 模型 '{}', {} 个关键帧",
            header.model_name,
            keyframes.len()
        );

        Ok(Self { header, keyframes })
    }
}

/// 解析相机关键帧列表（保持文件中的顺序）
pub fn decode(bytes: &[u8]) -> Result<Vec<CameraKeyframe>> {
    VmdCameraMotion::parse(bytes).map(|motion| motion.keyframes)
}

fn read_header(reader: &mut BinaryReader<'_>) -> Result<VmdHeader> {
    let signature = reader.read_array::<SIGNATURE_LEN>()?;
    let model_name = decode_shift_jis(reader.read_bytes(MODEL_NAME_LEN)?);
    Ok(VmdHeader {
        signature,
        model_name,
    })
}

/// 跳过一个 "数量 + 定长记录" 段
fn skip_section(reader: &mut BinaryReader<'_>, record_len: usize) -> Result<()> {
    let count = reader.read_u32()? as usize;
    reader.skip(count.saturating_mul(record_len))
}

/// 读取相机关键帧
fn read_camera_keyframe(reader: &mut BinaryReader<'_>) -> Result<CameraKeyframe> {
    let frame = reader.read_i32()?;
    if frame < 0 {
        return Err(MmdError::NegativeFrame(frame));
    }

    let distance = reader.read_f32()?;

    let px = reader.read_f32()?;
    let py = reader.read_f32()?;
    let pz = reader.read_f32()?;

    // 角度（文件中为弧度）
    let rx = reader.read_f32()?;
    let ry = reader.read_f32()?;
    let rz = reader.read_f32()?;

    let bezier = reader.read_array::<CAMERA_BEZIER_LEN>()?;
    let field_of_view = reader.read_i32()? as f32;

    // 透视标志，不使用
    reader.skip(1)?;

    Ok(CameraKeyframe {
        frame_index: frame as u32,
        distance,
        position: Vec3::new(px, py, pz),
        rotation: Vec3::new(to_degrees(rx), to_degrees(ry), to_degrees(rz)),
        field_of_view,
        bezier,
        is_authored: true,
    })
}

fn to_degrees(radians: f32) -> f32 {
    radians * 180.0 / PI
}

/// 解码 Shift-JIS 字符串
fn decode_shift_jis(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes[..end]);
    decoded.into_owned()
}


#[cfg(test)]
mod tests {
    use super::test_support::{camera_vmd, RawCameraFrame};
    use super::*;

    const PREFIX_LEN: usize = HEADER_LEN + 4 + 4 + 4;

    #[test]
    fn test_parse_camera_keyframes() {
        let mut second = RawCameraFrame::at(10, [10.0, 1.0, -2.0]);
        second.rotation = [PI / 2.0, -PI, 0.0];
        second.fov = 45;
        second.bezier[5] = 99;
        let bytes = camera_vmd(&[RawCameraFrame::at(0, [0.0; 3]), second]);
        assert_eq!(bytes.len(), PREFIX_LEN + 2 * CAMERA_KEYFRAME_LEN);

        let motion = VmdCameraMotion::parse(&bytes).unwrap();
        assert!(motion.header.is_recognized());
        assert_eq!(motion.header.model_name, "カメラ・照明");
        assert_eq!(motion.keyframes.len(), 2);

        let kf = &motion.keyframes[1];
        assert_eq!(kf.frame_index, 10);
        assert_eq!(kf.distance, -45.0);
        assert_eq!(kf.position, Vec3::new(10.0, 1.0, -2.0));
        assert!((kf.rotation.x - 90.0).abs() < 1e-4);
        assert!((kf.rotation.y + 180.0).abs() < 1e-4);
        assert_eq!(kf.field_of_view, 45.0);
        assert_eq!(kf.bezier[5], 99);
        assert!(kf.is_authored);
    }

    #[test]
    fn test_keeps_stream_order() {
        let bytes = camera_vmd(&[
            RawCameraFrame::at(30, [0.0; 3]),
            RawCameraFrame::at(0, [0.0; 3]),
            RawCameraFrame::at(15, [0.0; 3]),
        ]);
        let frames: Vec<u32> = decode(&bytes).unwrap().iter().map(|k| k.frame_index).collect();
        assert_eq!(frames, vec![30, 0, 15]);
    }

    #[test]
    fn test_truncated_anywhere() {
        let bytes = camera_vmd(&[
            RawCameraFrame::at(0, [0.0; 3]),
            RawCameraFrame::at(10, [10.0, 0.0, 0.0]),
        ]);
        for len in 0..bytes.len() {
            match decode(&bytes[..len]) {
                Err(MmdError::Truncated { .. }) => {}
                other => panic!("length {}: unexpected result {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_count_larger_than_data() {
        let mut bytes = camera_vmd(&[RawCameraFrame::at(0, [0.0; 3])]);
        bytes[HEADER_LEN + 8..HEADER_LEN + 12].copy_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(MmdError::Truncated { .. })));
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut bytes = camera_vmd(&[]);
        bytes[HEADER_LEN + 8..HEADER_LEN + 12].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(decode(&bytes), Err(MmdError::InvalidCount(-1))));

        let bytes = camera_vmd(&[RawCameraFrame::at(-5, [0.0; 3])]);
        assert!(matches!(decode(&bytes), Err(MmdError::NegativeFrame(-5))));
    }

    #[test]
    fn test_skips_bone_and_morph_sections() {
        let camera = camera_vmd(&[RawCameraFrame::at(7, [1.0, 2.0, 3.0])]);

        let mut bytes = camera[..HEADER_LEN].to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xEE; 2 * BONE_KEYFRAME_LEN]);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0xDD; MORPH_KEYFRAME_LEN]);
        bytes.extend_from_slice(&camera[HEADER_LEN + 8..]);

        let keyframes = decode(&bytes).unwrap();
        assert_eq!(keyframes.len(), 1);
        assert_eq!(keyframes[0].frame_index, 7);
        assert_eq!(keyframes[0].position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_unrecognized_signature_is_not_fatal() {
        let mut bytes = camera_vmd(&[RawCameraFrame::at(0, [0.0; 3])]);
        bytes[..4].copy_from_slice(b"XXXX");
        let motion = VmdCameraMotion::parse(&bytes).unwrap();
        assert!(!motion.header.is_recognized());
        assert_eq!(motion.keyframes.len(), 1);
    }
}
