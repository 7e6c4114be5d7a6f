//! 贝塞尔曲线插值

/// VMD 控制点所在空间的上限（0..=127）
pub const CONTROL_POINT_MAX: f32 = 127.0;

const NEWTON_ITERATIONS: usize = 15;
const BISECTION_ITERATIONS: usize = 48;
const EPSILON: f32 = 1e-6;

/// 贝塞尔曲线（用于 VMD 动画插值）
///
/// 起点固定为 (0, 0)，终点固定为 (1, 1)，控制点已归一化到 0..1。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl BezierCurve {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 线性插值
    pub fn linear() -> Self {
        Self::new(0.25, 0.25, 0.75, 0.75)
    }

    /// 从相机插值字节组创建
    ///
    /// 字节顺序为 `[x1, x2, y1, y2]`，即 P1 = (b0, b2)，P2 = (b1, b3)。
    pub fn from_control_bytes(data: &[u8; 4]) -> Self {
        Self {
            x1: data[0] as f32 / CONTROL_POINT_MAX,
            x2: data[1] as f32 / CONTROL_POINT_MAX,
            y1: data[2] as f32 / CONTROL_POINT_MAX,
            y2: data[3] as f32 / CONTROL_POINT_MAX,
        }
    }

    /// 控制点位于对角线上时曲线退化为直线
    pub fn is_linear(&self) -> bool {
        self.x1 == self.y1 && self.x2 == self.y2
    }

    /// 评估贝塞尔曲线：求解 x(s) = t，返回 y(s)
    pub fn evaluate(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        if self.is_linear() {
            return t;
        }

        let s = self.solve_newton(t).unwrap_or_else(|| self.solve_bisection(t));
        self.bezier_y(s)
    }

    /// 牛顿法求解 x(s) = t；不收敛或越界时返回 None
    fn solve_newton(&self, t: f32) -> Option<f32> {
        let mut s = t;
        for _ in 0..NEWTON_ITERATIONS {
            let x = self.bezier_x(s) - t;
            if x.abs() < EPSILON {
                return Some(s);
            }

            let dx = self.bezier_dx(s);
            if dx.abs() < EPSILON {
                return None;
            }

            s -= x / dx;
            if !(0.0..=1.0).contains(&s) {
                return None;
            }
        }

        ((self.bezier_x(s) - t).abs() < EPSILON * 10.0).then_some(s)
    }

    /// 二分法兜底；x(0) = 0、x(1) = 1，区间内必有解
    fn solve_bisection(&self, t: f32) -> f32 {
        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        let mut s = t;
        for _ in 0..BISECTION_ITERATIONS {
            s = (lo + hi) * 0.5;
            let x = self.bezier_x(s);
            if (x - t).abs() < EPSILON {
                break;
            }
            if x < t {
                lo = s;
            } else {
                hi = s;
            }
        }
        s
    }

    fn bezier_x(&self, s: f32) -> f32 {
        let s2 = s * s;
        let s3 = s2 * s;
        let t = 1.0 - s;
        let t2 = t * t;

        3.0 * t2 * s * self.x1 + 3.0 * t * s2 * self.x2 + s3
    }

    fn bezier_y(&self, s: f32) -> f32 {
        let s2 = s * s;
        let s3 = s2 * s;
        let t = 1.0 - s;
        let t2 = t * t;

        3.0 * t2 * s * self.y1 + 3.0 * t * s2 * self.y2 + s3
    }

    fn bezier_dx(&self, s: f32) -> f32 {
        let s2 = s * s;
        let t = 1.0 - s;

        3.0 * t * t * self.x1 + 6.0 * t * s * (self.x2 - self.x1) + 3.0 * s2 * (1.0 - self.x2)
    }
}
