//! 播放器上下文
//!
//! 持有配置、相机时间轴列表、播放状态与后台计算线程，由调用方显式创建和销毁。
//! 同一时刻只有一个相机处于激活状态，后台只为它计算姿态。

use std::path::Path;
use std::sync::Arc;

use crate::animation::{
    self, CameraKeyframe, CameraPose, CameraTimeline, PlaybackState, VmdCameraMotion,
};
use crate::config::EngineConfig;
use crate::worker::{CalculatorWorker, CameraPosePreCalculator, PoseCalculator};
use crate::{MmdError, Result};

pub struct MotionPlayer {
    config: EngineConfig,
    playback: PlaybackState,
    cameras: Vec<Arc<CameraTimeline>>,
    active_camera: Option<usize>,
    camera_calculator: Option<Arc<CameraPosePreCalculator>>,
    worker: CalculatorWorker,
}

impl MotionPlayer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            playback: PlaybackState::new(&config.playback),
            worker: CalculatorWorker::new(config.worker.clone()),
            cameras: Vec::new(),
            active_camera: None,
            camera_calculator: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 加载相机动作，替换所有已加载的相机；失败时保留之前的状态
    pub fn load_camera_motion(&mut self, bytes: &[u8]) -> Result<()> {
        let result = self.build_camera(bytes).and_then(|timeline| {
            let timeline = Arc::new(timeline);
            let frame = animation::frame_index(&timeline, &self.playback);
            self.attach_calculator(&timeline, frame)?;

            log::info!("相机动作已加载: {} 帧", timeline.frame_count());
            self.cameras = vec![timeline];
            self.active_camera = Some(0);
            Ok(())
        });

        if let Err(ref e) = result {
            log::error!("Failed to load VMD camera motion: {}", e);
        }
        result
    }

    /// 从文件加载相机动作
    pub fn load_camera_motion_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            log::error!("Failed to read {}: {}", path.as_ref().display(), e);
            e
        })?;
        self.load_camera_motion(&bytes)
    }

    /// 追加一个相机动作，返回其编号
    ///
    /// 第一个加入的相机自动成为当前相机，之后加入的需要 [`Self::set_active_camera`] 切换。
    pub fn add_camera_motion(&mut self, bytes: &[u8]) -> Result<usize> {
        let result = self
            .build_camera(bytes)
            .and_then(|timeline| self.push_camera(Arc::new(timeline)));

        if let Err(ref e) = result {
            log::error!("Failed to add VMD camera motion: {}", e);
        }
        result
    }

    /// 切换当前相机并把播放时间归零；编号越界时不改变任何状态
    pub fn set_active_camera(&mut self, index: usize) -> Result<()> {
        let Some(timeline) = self.cameras.get(index).cloned() else {
            return Err(MmdError::CameraIndexOutOfRange {
                index,
                count: self.cameras.len(),
            });
        };

        self.attach_calculator(&timeline, 0)?;
        self.playback.seek(0.0);
        self.active_camera = Some(index);
        log::info!("切换到相机 {}", index);
        Ok(())
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    pub fn active_camera_index(&self) -> Option<usize> {
        self.active_camera
    }

    fn build_camera(&self, bytes: &[u8]) -> Result<CameraTimeline> {
        let motion = VmdCameraMotion::parse(bytes)?;
        CameraTimeline::build_with_config(motion.keyframes, &self.config.timeline)
    }

    fn push_camera(&mut self, timeline: Arc<CameraTimeline>) -> Result<usize> {
        let index = self.cameras.len();
        if self.active_camera.is_none() {
            let frame = animation::frame_index(&timeline, &self.playback);
            self.attach_calculator(&timeline, frame)?;
            self.active_camera = Some(index);
        }

        log::info!("相机 {} 已加入: {} 帧", index, timeline.frame_count());
        self.cameras.push(timeline);
        Ok(index)
    }

    /// 为时间轴注册新的计算器并替换旧的；注册失败时旧计算器保持不变
    fn attach_calculator(&mut self, timeline: &Arc<CameraTimeline>, frame: usize) -> Result<()> {
        let calculator = Arc::new(CameraPosePreCalculator::new(
            Arc::clone(timeline),
            self.config.camera_rig.clone(),
        ));
        self.worker.register(calculator.clone())?;
        self.detach_calculator();

        calculator.request(frame);
        self.wake(&calculator);
        self.camera_calculator = Some(calculator);
        Ok(())
    }

    fn detach_calculator(&mut self) {
        if let Some(old) = self.camera_calculator.take() {
            let old: Arc<dyn PoseCalculator> = old;
            self.worker.unregister(&old);
        }
    }

    fn wake(&self, calculator: &Arc<CameraPosePreCalculator>) {
        let calculator: Arc<dyn PoseCalculator> = calculator.clone();
        self.worker.notify(&calculator);
    }

    /// 卸载全部相机动作
    pub fn unload_camera(&mut self) {
        self.detach_calculator();
        self.cameras.clear();
        self.active_camera = None;
    }

    /// 当前相机的时间轴
    pub fn camera_timeline(&self) -> Option<&Arc<CameraTimeline>> {
        self.active_camera.and_then(|index| self.cameras.get(index))
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn play(&mut self) {
        self.playback.play();
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn is_playing(&self) -> bool {
        self.playback.playing
    }

    /// 跳转到指定时间（秒）
    pub fn seek(&mut self, time: f64) {
        self.playback.seek(time);
        self.request_camera_pose();
    }

    /// 每帧调用：推进时间并请求后台计算新帧的相机姿态
    pub fn update(&mut self, delta_seconds: f64) {
        if !self.playback.playing {
            return;
        }
        self.playback.advance(delta_seconds);
        self.request_camera_pose();
    }

    fn request_camera_pose(&self) {
        if let (Some(timeline), Some(calculator)) = (self.camera_timeline(), &self.camera_calculator) {
            calculator.request(animation::frame_index(timeline, &self.playback));
            self.wake(calculator);
        }
    }

    /// 当前帧的相机关键帧
    pub fn camera_keyframe(&self) -> Option<&CameraKeyframe> {
        self.camera_timeline()
            .map(|timeline| animation::sample(timeline, &self.playback))
    }

    /// 帧间插值后的相机关键帧
    pub fn camera_keyframe_precise(&self) -> Option<CameraKeyframe> {
        self.camera_timeline()
            .map(|timeline| animation::sample_precisely(timeline, &self.playback))
    }

    /// 后台线程最近一次算好的相机姿态（可能落后当前帧）
    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.camera_calculator.as_ref().and_then(|c| c.latest())
    }

    /// 停止后台线程；之后不能再加载动作
    pub fn shutdown(&mut self) -> Result<()> {
        self.detach_calculator();
        self.worker.shutdown()
    }
}

impl Default for MotionPlayer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
