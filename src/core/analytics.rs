use crate::domain::model::{AnalyticsSnapshot, EmotionalImpact};
use rand::Rng;

pub const ENGAGEMENT_KEYWORDS: [&str; 6] = ["vibrant", "bold", "stunning", "amazing", "neon", "wave"];

/// 以單一空白切字，計算命中關鍵字的數量
pub fn keyword_score(prompt: &str) -> usize {
    prompt
        .to_lowercase()
        .split(' ')
        .filter(|word| ENGAGEMENT_KEYWORDS.contains(word))
        .count()
}

pub fn estimate<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> AnalyticsSnapshot {
    let score = keyword_score(prompt) as f64;

    AnalyticsSnapshot {
        predicted_engagement: (72.0 + score * 6.0 + rng.gen_range(0.0..12.0)).min(97.0),
        viral_score: (68.0 + score * 7.0 + rng.gen_range(0.0..16.0)).min(96.0),
        emotional_impact: EmotionalImpact {
            excitement: rng.gen_range(0.0..25.0) + 50.0,
            innovation: rng.gen_range(0.0..20.0) + 35.0,
            trust: rng.gen_range(0.0..20.0) + 25.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_keyword_score_counts_exact_words() {
        assert_eq!(keyword_score("A Vibrant neon wave"), 3);
        // 標點黏在字上就不算
        assert_eq!(keyword_score("bold, stunning"), 1);
        assert_eq!(keyword_score("plain cat"), 0);
    }

    #[test]
    fn test_estimate_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for prompt in ["cat", "vibrant bold stunning amazing neon wave neon neon"] {
            for _ in 0..200 {
                let snapshot = estimate(prompt, &mut rng);
                assert!(snapshot.predicted_engagement >= 72.0 && snapshot.predicted_engagement <= 97.0);
                assert!(snapshot.viral_score >= 68.0 && snapshot.viral_score <= 96.0);
                assert!((50.0..75.0).contains(&snapshot.emotional_impact.excitement));
                assert!((35.0..55.0).contains(&snapshot.emotional_impact.innovation));
                assert!((25.0..45.0).contains(&snapshot.emotional_impact.trust));
            }
        }
    }

    #[test]
    fn test_keywords_raise_the_floor() {
        let mut rng = StdRng::seed_from_u64(42);
        let snapshot = estimate("vibrant bold neon", &mut rng);
        assert!(snapshot.predicted_engagement >= 72.0 + 18.0);
        assert!(snapshot.viral_score >= 68.0 + 21.0);
    }

    #[test]
    fn test_saturated_prompt_hits_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        let snapshot = estimate("neon neon neon neon neon neon", &mut rng);
        assert_eq!(snapshot.predicted_engagement, 97.0);
        assert_eq!(snapshot.viral_score, 96.0);
    }
}
