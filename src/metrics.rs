use std::sync::LazyLock;

use prometheus::*;

static METRIC_ADD_IMAGE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "imvdb_add_image_count",
        "count of images added per collection",
        &["collection"]
    )
    .unwrap()
});

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "imvdb_search_count",
        "count of similarity searches per collection",
        &["collection"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "imvdb_search_duration",
        "duration of the per-image search in seconds",
        &["collection"]
    )
    .unwrap()
});

static METRIC_SEARCH_MAX_SCORE: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "imvdb_search_max_score",
        "max cosine similarity of the per-image search",
        &["collection"],
        (0..=20).map(|x| x as f64 / 10.0 - 1.0).collect()
    )
    .unwrap()
});

/// 增加图片入库计数
pub fn inc_add_image(collection: &str) {
    METRIC_ADD_IMAGE_COUNT.with_label_values(&[collection]).inc();
}

/// 增加搜索计数
pub fn inc_search_count(collection: &str) {
    METRIC_SEARCH_COUNT.with_label_values(&[collection]).inc();
}

/// 记录单次搜索耗时
pub fn observe_search_duration(collection: &str, duration: f32) {
    METRIC_SEARCH_DURATION.with_label_values(&[collection]).observe(duration as f64);
}

/// 记录单次搜索的最高相似度
pub fn observe_search_max_score(collection: &str, score: f32) {
    METRIC_SEARCH_MAX_SCORE.with_label_values(&[collection]).observe(score as f64);
}
