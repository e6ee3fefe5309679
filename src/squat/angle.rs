/// 頂点 `b` における角度 (度, 0〜180)
///
/// 半直線 b→a と b→c の atan2 の差から求め、180度を超える場合は
/// 反対側 (360 - angle) を返す。点が重なっていても 0 か 180 になる。
pub fn joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let radians = f32::atan2(c.1 - b.1, c.0 - b.0) - f32::atan2(a.1 - b.1, a.0 - b.0);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
