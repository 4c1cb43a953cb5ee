// ==========================================
// 驾驶舱 API 测试
// ==========================================
// 职责: 验证只读聚合查询 (在制概览/活跃/逾期/负载)
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod dashboard_api_test {
    use chrono::Duration;

    use wip_workflow::api::{ApiError, CreateOrderRequest};
    use wip_workflow::domain::types::OrderStatus;

    use crate::test_helpers::{setup_test_env, TestEnv};

    fn create_order(
        env: &TestEnv,
        name: &str,
        value: Option<f64>,
        due_in_hours: Option<i64>,
    ) -> String {
        let now = chrono::Utc::now().naive_utc();
        env.workflow_api
            .create_order(
                CreateOrderRequest {
                    product_name: name.to_string(),
                    quantity: 1,
                    estimated_completion: due_in_hours.map(|h| now + Duration::hours(h)),
                    estimated_value: value,
                },
                "tester",
            )
            .unwrap()
            .order_id
    }

    #[test]
    fn test_wip_dashboard_counts_and_values() {
        let env = setup_test_env();
        let api = &env.workflow_api;

        // 1 PENDING, 2 IN_PROGRESS (其一逾期), 1 CANCELLED
        create_order(&env, "A", Some(100.0), None);
        let b = create_order(&env, "B", Some(200.0), Some(48));
        let c = create_order(&env, "C", Some(300.0), Some(-2));
        let d = create_order(&env, "D", Some(400.0), None);
        api.start_production(&b, Some("alice"), None, "tester").unwrap();
        api.start_production(&c, Some("bob"), None, "tester").unwrap();
        api.cancel_production(&d, "撤单", "tester").unwrap();

        let dashboard = env
            .dashboard_api
            .get_wip_dashboard(None, None, None, None)
            .unwrap();

        assert_eq!(dashboard.total_orders, 4);
        assert_eq!(dashboard.overdue_count, 1);
        assert!((dashboard.total_estimated_value - 1000.0).abs() < f64::EPSILON);
        assert!((dashboard.active_estimated_value - 600.0).abs() < f64::EPSILON);

        let count_of = |status: OrderStatus| {
            dashboard
                .status_counts
                .iter()
                .find(|c| c.status == status)
                .map(|c| c.count)
                .unwrap()
        };
        assert_eq!(count_of(OrderStatus::Pending), 1);
        assert_eq!(count_of(OrderStatus::InProgress), 2);
        assert_eq!(count_of(OrderStatus::Cancelled), 1);
        assert_eq!(count_of(OrderStatus::Completed), 0);
    }

    #[test]
    fn test_wip_dashboard_assignee_filter_and_recent_bound() {
        let env = setup_test_env();
        let api = &env.workflow_api;

        for i in 0..5 {
            let id = create_order(&env, &format!("批次{}", i), None, None);
            api.start_production(&id, Some("alice"), None, "tester").unwrap();
        }
        let other = create_order(&env, "其他", None, None);
        api.start_production(&other, Some("bob"), None, "tester").unwrap();

        let dashboard = env
            .dashboard_api
            .get_wip_dashboard(None, None, Some("alice"), Some(3))
            .unwrap();
        assert_eq!(dashboard.total_orders, 5);
        assert_eq!(dashboard.recent_orders.len(), 3);

        // limit 越界
        let err = env
            .dashboard_api
            .get_wip_dashboard(None, None, None, Some(0))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_wip_dashboard_invalid_window() {
        let env = setup_test_env();
        let now = chrono::Utc::now().naive_utc();
        let err = env
            .dashboard_api
            .get_wip_dashboard(Some(now), Some(now - Duration::days(1)), None, None)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_active_productions_filters() {
        let env = setup_test_env();
        let api = &env.workflow_api;

        let a = create_order(&env, "A", None, None);
        let b = create_order(&env, "B", None, None);
        let c = create_order(&env, "C", None, None);
        api.start_production(&a, Some("alice"), None, "tester").unwrap();
        api.start_production(&b, Some("alice"), None, "tester").unwrap();
        api.put_on_hold(&b, "缺料", "tester").unwrap();
        api.cancel_production(&c, "撤单", "tester").unwrap();

        // 全部活跃工单 (终态排除)
        let active = env.dashboard_api.get_active_productions(None, None).unwrap();
        assert_eq!(active.len(), 2);

        // 状态过滤
        let on_hold = env
            .dashboard_api
            .get_active_productions(None, Some(OrderStatus::OnHold))
            .unwrap();
        assert_eq!(on_hold.len(), 1);
        assert_eq!(on_hold[0].order_id, b);

        // 员工过滤
        let alice = env
            .dashboard_api
            .get_active_productions(Some("alice"), None)
            .unwrap();
        assert_eq!(alice.len(), 2);

        // 终态状态过滤是非法输入
        let err = env
            .dashboard_api
            .get_active_productions(None, Some(OrderStatus::Completed))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_overdue_productions_sorted_most_overdue_first() {
        let env = setup_test_env();
        let api = &env.workflow_api;

        let slight = create_order(&env, "轻度逾期", None, Some(-3));
        let severe = create_order(&env, "严重逾期", None, Some(-72));
        let future = create_order(&env, "未逾期", None, Some(24));
        let closed = create_order(&env, "已完成", None, Some(-100));
        api.start_production(&slight, None, None, "tester").unwrap();
        api.start_production(&severe, None, None, "tester").unwrap();
        api.start_production(&future, None, None, "tester").unwrap();
        // closed: 走完质检后为终态,不计逾期
        api.start_production(&closed, None, None, "tester").unwrap();
        api.update_production_status(&closed, OrderStatus::QualityCheckPending, None, None, "tester")
            .unwrap();
        api.complete_quality_check(&closed, true, None, None, "tester").unwrap();

        let overdue = env.dashboard_api.get_overdue_productions().unwrap();
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].order.order_id, severe);
        assert_eq!(overdue[1].order.order_id, slight);
        assert!(overdue[0].overdue_hours > overdue[1].overdue_hours);
    }

    #[test]
    fn test_employee_workload_grouping() {
        let env = setup_test_env();
        let api = &env.workflow_api;

        // alice: 2 在制 (1 逾期); bob: 1 在制; 1 未指派; 1 终态不计
        let a1 = create_order(&env, "A1", None, Some(-5));
        let a2 = create_order(&env, "A2", None, Some(24));
        let b1 = create_order(&env, "B1", None, None);
        let _none = create_order(&env, "未指派", None, None);
        let done = create_order(&env, "终态", None, None);
        api.start_production(&a1, Some("alice"), None, "tester").unwrap();
        api.start_production(&a2, Some("alice"), None, "tester").unwrap();
        api.start_production(&b1, Some("bob"), None, "tester").unwrap();
        api.cancel_production(&done, "撤单", "tester").unwrap();

        let workloads = env.workflow_api.get_employee_workload().unwrap();
        assert_eq!(workloads.len(), 3);

        // 负载降序,未指派桶最后
        assert_eq!(workloads[0].assigned_to.as_deref(), Some("alice"));
        assert_eq!(workloads[0].active_count, 2);
        assert_eq!(workloads[0].overdue_count, 1);
        assert_eq!(workloads[1].assigned_to.as_deref(), Some("bob"));
        assert_eq!(workloads[1].active_count, 1);
        assert!(workloads[2].assigned_to.is_none());
        assert_eq!(workloads[2].active_count, 1);
    }

    #[test]
    fn test_recent_activity_feed() {
        let env = setup_test_env();
        let api = &env.workflow_api;
        let id = create_order(&env, "活动流", None, None);
        api.start_production(&id, None, None, "tester").unwrap();
        api.put_on_hold(&id, "缺料", "tester").unwrap();

        let recent = env.dashboard_api.get_recent_activity(10).unwrap();
        assert_eq!(recent.len(), 2);

        let err = env.dashboard_api.get_recent_activity(0).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
