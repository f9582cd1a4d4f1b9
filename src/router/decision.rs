//! 路由决策：每个任务的得分、最佳任务与阈值判断（只用于分派与日志，不持久化）

/// 单个任务的相似度
#[derive(Debug, Clone, PartialEq)]
pub struct TaskScore {
    pub index: usize,
    pub name: String,
    pub score: f32,
}

/// 一次查询的路由决策
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    pub scores: Vec<TaskScore>,
    pub best_index: usize,
    pub best_name: String,
    pub best_score: f32,
    pub threshold: f32,
    /// best_score >= threshold
    pub accepted: bool,
}

/// argmax；并列时取最小下标（先注册者胜）
pub fn select_best(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best
}

impl RoutingDecision {
    /// names 与 scores 按注册顺序一一对应；为空时返回 None
    pub fn new(names: &[String], scores: Vec<f32>, threshold: f32) -> Option<Self> {
        let (best_index, best_score) = select_best(&scores)?;
        let scores: Vec<TaskScore> = names
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(index, (name, score))| TaskScore {
                index,
                name: name.clone(),
                score,
            })
            .collect();
        Some(Self {
            best_name: names.get(best_index).cloned().unwrap_or_default(),
            scores,
            best_index,
            best_score,
            threshold,
            // 严格小于才拒绝：等于阈值视为接受（得分来自单位向量，总是有限值）
            accepted: best_score >= threshold,
        })
    }

    /// 被接受时返回最佳任务下标
    pub fn selected(&self) -> Option<usize> {
        self.accepted.then_some(self.best_index)
    }
}
