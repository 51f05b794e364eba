//! Built-in query templates.
//!
//! Conventions:
//! - every template queries the logical `transactions` relation
//! - date windows are half-open: `start` inclusive, `end` exclusive
//! - `{where}` marks where shared filter fragments are rendered; required
//!   date-range parameters guarantee the block is never empty, so templates
//!   may append fixed predicates after it with `AND`
//! - monetary ratios guard the zero denominator explicitly, DataFusion does
//!   not forgive division by zero

use fyq_common::ParamKind;

use crate::{NamedQuery, ParamSpec, QueryDomain};

fn p_start() -> ParamSpec {
    ParamSpec {
        name: "start",
        kind: ParamKind::Date,
        required: true,
        filter: Some("sold_date >= $start"),
    }
}

fn p_end() -> ParamSpec {
    ParamSpec {
        name: "end",
        kind: ParamKind::Date,
        required: true,
        filter: Some("sold_date < $end"),
    }
}

fn p_store() -> ParamSpec {
    ParamSpec {
        name: "store_id",
        kind: ParamKind::Text,
        required: false,
        filter: Some("store_id = $store_id"),
    }
}

fn p_dept() -> ParamSpec {
    ParamSpec {
        name: "dept_code",
        kind: ParamKind::Text,
        required: false,
        filter: Some("dept_code = $dept_code"),
    }
}

fn p_channel() -> ParamSpec {
    ParamSpec {
        name: "channel",
        kind: ParamKind::Text,
        required: false,
        filter: Some("channel = $channel"),
    }
}

fn p_limit() -> ParamSpec {
    ParamSpec {
        name: "limit",
        kind: ParamKind::Int,
        required: false,
        filter: None,
    }
}

/// A parameter referenced directly in the template body rather than through
/// the shared filter block. Always required.
fn embedded(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        filter: None,
    }
}

pub(crate) fn entries() -> Vec<NamedQuery> {
    vec![
        // Sales.
        NamedQuery {
            name: "top_items",
            domain: QueryDomain::Sales,
            description: "Best-selling items by revenue over a date range",
            sql: "SELECT item_id, item_name, \
                         SUM(quantity) AS quantity, \
                         SUM(revenue) AS revenue, \
                         SUM(margin) AS margin \
                  FROM transactions \
                  {where} \
                  GROUP BY item_id, item_name \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_store(), p_dept(), p_limit()],
        },
        NamedQuery {
            name: "sales_summary",
            domain: QueryDomain::Sales,
            description: "Headline totals: lines, baskets, units, revenue, margin",
            sql: "SELECT COUNT(*) AS line_items, \
                         COUNT(DISTINCT basket_id) AS baskets, \
                         COUNT(DISTINCT store_id) AS stores, \
                         SUM(quantity) AS quantity, \
                         SUM(revenue) AS revenue, \
                         SUM(margin) AS margin \
                  FROM transactions \
                  {where}",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "daily_sales",
            domain: QueryDomain::Sales,
            description: "Revenue, units and basket counts per calendar day",
            sql: "SELECT sold_date, \
                         SUM(revenue) AS revenue, \
                         SUM(quantity) AS quantity, \
                         COUNT(DISTINCT basket_id) AS baskets \
                  FROM transactions \
                  {where} \
                  GROUP BY sold_date \
                  ORDER BY sold_date",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "weekly_sales",
            domain: QueryDomain::Sales,
            description: "Revenue, units and basket counts per fiscal week",
            sql: "SELECT fin_year, fin_week, \
                         SUM(revenue) AS revenue, \
                         SUM(quantity) AS quantity, \
                         COUNT(DISTINCT basket_id) AS baskets \
                  FROM transactions \
                  {where} \
                  GROUP BY fin_year, fin_week \
                  ORDER BY fin_year, fin_week",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "sales_by_department",
            domain: QueryDomain::Sales,
            description: "Revenue, units and margin grouped by department",
            sql: "SELECT dept_code, \
                         SUM(quantity) AS quantity, \
                         SUM(revenue) AS revenue, \
                         SUM(margin) AS margin \
                  FROM transactions \
                  {where} \
                  GROUP BY dept_code \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "sales_by_category",
            domain: QueryDomain::Sales,
            description: "Revenue, units and margin grouped by category",
            sql: "SELECT dept_code, category_code, \
                         SUM(quantity) AS quantity, \
                         SUM(revenue) AS revenue, \
                         SUM(margin) AS margin \
                  FROM transactions \
                  {where} \
                  GROUP BY dept_code, category_code \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_store(), p_dept()],
        },
        NamedQuery {
            name: "margin_by_department",
            domain: QueryDomain::Sales,
            description: "Margin rate per department over a date range",
            sql: "SELECT dept_code, \
                         SUM(revenue) AS revenue, \
                         SUM(margin) AS margin, \
                         CASE WHEN SUM(revenue) = 0 THEN 0.0 \
                              ELSE SUM(margin) / SUM(revenue) \
                         END AS margin_rate \
                  FROM transactions \
                  {where} \
                  GROUP BY dept_code \
                  ORDER BY margin_rate DESC",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "revenue_by_store",
            domain: QueryDomain::Sales,
            description: "Store ranking by revenue over a date range",
            sql: "SELECT store_id, store_name, \
                         SUM(revenue) AS revenue, \
                         SUM(margin) AS margin, \
                         COUNT(DISTINCT basket_id) AS baskets \
                  FROM transactions \
                  {where} \
                  GROUP BY store_id, store_name \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_channel(), p_limit()],
        },
        NamedQuery {
            name: "store_item_velocity",
            domain: QueryDomain::Sales,
            description: "Units sold per active selling day, per store and item",
            sql: "SELECT store_id, item_id, item_name, \
                         SUM(quantity) AS quantity, \
                         SUM(quantity) / COUNT(DISTINCT sold_date) AS units_per_active_day \
                  FROM transactions \
                  {where} \
                  GROUP BY store_id, item_id, item_name \
                  ORDER BY units_per_active_day DESC",
            params: vec![p_start(), p_end(), p_store(), p_dept(), p_limit()],
        },
        // Customer.
        NamedQuery {
            name: "top_customers",
            domain: QueryDomain::Customer,
            description: "Identified customers ranked by revenue",
            sql: "SELECT customer_id, \
                         COUNT(DISTINCT basket_id) AS visits, \
                         SUM(revenue) AS revenue, \
                         SUM(revenue) / COUNT(DISTINCT basket_id) AS revenue_per_visit \
                  FROM transactions \
                  {where} AND customer_id IS NOT NULL \
                  GROUP BY customer_id \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_store(), p_limit()],
        },
        NamedQuery {
            name: "customer_visit_frequency",
            domain: QueryDomain::Customer,
            description: "How many identified customers visited once, twice, and so on",
            sql: "WITH visits AS ( \
                      SELECT customer_id, COUNT(DISTINCT basket_id) AS visits \
                      FROM transactions \
                      {where} AND customer_id IS NOT NULL \
                      GROUP BY customer_id \
                  ) \
                  SELECT visits, COUNT(*) AS customers \
                  FROM visits \
                  GROUP BY visits \
                  ORDER BY visits",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "customer_basket_value",
            domain: QueryDomain::Customer,
            description: "Average and total basket value per identified customer",
            sql: "WITH baskets AS ( \
                      SELECT customer_id, basket_id, SUM(revenue) AS basket_revenue \
                      FROM transactions \
                      {where} AND customer_id IS NOT NULL \
                      GROUP BY customer_id, basket_id \
                  ) \
                  SELECT customer_id, \
                         COUNT(*) AS baskets, \
                         AVG(basket_revenue) AS avg_basket_value, \
                         SUM(basket_revenue) AS revenue \
                  FROM baskets \
                  GROUP BY customer_id \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_store(), p_limit()],
        },
        NamedQuery {
            name: "loyalty_share",
            domain: QueryDomain::Customer,
            description: "Share of revenue attributed to identified customers",
            sql: "SELECT SUM(revenue) AS total_revenue, \
                         SUM(CASE WHEN customer_id IS NOT NULL THEN revenue ELSE 0.0 END) \
                             AS identified_revenue, \
                         CASE WHEN SUM(revenue) = 0 THEN 0.0 \
                              ELSE SUM(CASE WHEN customer_id IS NOT NULL THEN revenue ELSE 0.0 END) \
                                   / SUM(revenue) \
                         END AS identified_share \
                  FROM transactions \
                  {where}",
            params: vec![p_start(), p_end(), p_store()],
        },
        // Out of stock.
        NamedQuery {
            name: "oos_candidates",
            domain: QueryDomain::OutOfStock,
            description: "Items selling before the midpoint but absent after it",
            sql: "WITH earlier AS ( \
                      SELECT item_id, item_name, SUM(quantity) AS quantity \
                      FROM transactions \
                      WHERE sold_date >= $start AND sold_date < $mid \
                      GROUP BY item_id, item_name \
                  ), \
                  later AS ( \
                      SELECT DISTINCT item_id \
                      FROM transactions \
                      WHERE sold_date >= $mid AND sold_date < $end \
                  ) \
                  SELECT e.item_id, e.item_name, e.quantity AS earlier_quantity \
                  FROM earlier e \
                  WHERE e.item_id NOT IN (SELECT item_id FROM later) \
                  ORDER BY earlier_quantity DESC",
            params: vec![
                embedded("start", ParamKind::Date),
                embedded("mid", ParamKind::Date),
                embedded("end", ParamKind::Date),
                p_limit(),
            ],
        },
        NamedQuery {
            name: "zero_movement_items",
            domain: QueryDomain::OutOfStock,
            description: "Items whose net unit movement is zero or negative",
            sql: "SELECT item_id, item_name, SUM(quantity) AS quantity \
                  FROM transactions \
                  {where} \
                  GROUP BY item_id, item_name \
                  HAVING SUM(quantity) <= 0 \
                  ORDER BY quantity",
            params: vec![p_start(), p_end(), p_store(), p_dept()],
        },
        NamedQuery {
            name: "oos_store_exposure",
            domain: QueryDomain::OutOfStock,
            description: "Stores ranked by items stocked before the midpoint but unsold after it",
            sql: "WITH earlier AS ( \
                      SELECT DISTINCT store_id, store_name, item_id \
                      FROM transactions \
                      WHERE sold_date >= $start AND sold_date < $mid \
                  ) \
                  SELECT e.store_id, e.store_name, COUNT(*) AS missing_items \
                  FROM earlier e \
                  WHERE NOT EXISTS ( \
                      SELECT 1 FROM transactions t \
                      WHERE t.store_id = e.store_id \
                        AND t.item_id = e.item_id \
                        AND t.sold_date >= $mid AND t.sold_date < $end \
                  ) \
                  GROUP BY e.store_id, e.store_name \
                  ORDER BY missing_items DESC",
            params: vec![
                embedded("start", ParamKind::Date),
                embedded("mid", ParamKind::Date),
                embedded("end", ParamKind::Date),
            ],
        },
        // Basket.
        NamedQuery {
            name: "basket_value_distribution",
            domain: QueryDomain::Basket,
            description: "Basket counts and revenue by basket value band",
            sql: "WITH baskets AS ( \
                      SELECT basket_id, SUM(revenue) AS basket_revenue \
                      FROM transactions \
                      {where} \
                      GROUP BY basket_id \
                  ) \
                  SELECT CASE WHEN basket_revenue < 10 THEN 'under_10' \
                              WHEN basket_revenue < 25 THEN '10_to_25' \
                              WHEN basket_revenue < 50 THEN '25_to_50' \
                              WHEN basket_revenue < 100 THEN '50_to_100' \
                              ELSE '100_plus' \
                         END AS band, \
                         COUNT(*) AS baskets, \
                         SUM(basket_revenue) AS revenue \
                  FROM baskets \
                  GROUP BY CASE WHEN basket_revenue < 10 THEN 'under_10' \
                                WHEN basket_revenue < 25 THEN '10_to_25' \
                                WHEN basket_revenue < 50 THEN '25_to_50' \
                                WHEN basket_revenue < 100 THEN '50_to_100' \
                                ELSE '100_plus' \
                           END \
                  ORDER BY MIN(basket_revenue)",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "basket_size_by_store",
            domain: QueryDomain::Basket,
            description: "Average basket size and value per store",
            sql: "WITH baskets AS ( \
                      SELECT store_id, store_name, basket_id, \
                             SUM(quantity) AS items, \
                             SUM(revenue) AS basket_revenue \
                      FROM transactions \
                      {where} \
                      GROUP BY store_id, store_name, basket_id \
                  ) \
                  SELECT store_id, store_name, \
                         COUNT(*) AS baskets, \
                         AVG(items) AS avg_items, \
                         AVG(basket_revenue) AS avg_basket_value \
                  FROM baskets \
                  GROUP BY store_id, store_name \
                  ORDER BY avg_basket_value DESC",
            params: vec![p_start(), p_end(), p_channel()],
        },
        NamedQuery {
            name: "basket_penetration",
            domain: QueryDomain::Basket,
            description: "Share of baskets containing at least one line from a department",
            sql: "SELECT COUNT(DISTINCT basket_id) AS baskets, \
                         COUNT(DISTINCT CASE WHEN dept_code = $dept_code THEN basket_id END) \
                             AS baskets_with_department, \
                         CASE WHEN COUNT(DISTINCT basket_id) = 0 THEN 0.0 \
                              ELSE CAST(COUNT(DISTINCT CASE WHEN dept_code = $dept_code \
                                                            THEN basket_id END) AS DOUBLE) \
                                   / COUNT(DISTINCT basket_id) \
                         END AS penetration \
                  FROM transactions \
                  {where}",
            params: vec![
                p_start(),
                p_end(),
                p_store(),
                embedded("dept_code", ParamKind::Text),
            ],
        },
        NamedQuery {
            name: "cross_department_baskets",
            domain: QueryDomain::Basket,
            description: "Department pairs most often bought together in one basket",
            sql: "WITH dept_baskets AS ( \
                      SELECT DISTINCT basket_id, dept_code \
                      FROM transactions \
                      {where} \
                  ) \
                  SELECT a.dept_code AS dept_a, b.dept_code AS dept_b, \
                         COUNT(*) AS baskets \
                  FROM dept_baskets a \
                  JOIN dept_baskets b \
                    ON a.basket_id = b.basket_id AND a.dept_code < b.dept_code \
                  GROUP BY a.dept_code, b.dept_code \
                  ORDER BY baskets DESC",
            params: vec![p_start(), p_end(), p_store(), p_limit()],
        },
        // Channel.
        NamedQuery {
            name: "channel_mix",
            domain: QueryDomain::Channel,
            description: "Baskets, units and revenue per sales channel",
            sql: "SELECT channel, \
                         COUNT(DISTINCT basket_id) AS baskets, \
                         SUM(quantity) AS quantity, \
                         SUM(revenue) AS revenue \
                  FROM transactions \
                  {where} \
                  GROUP BY channel \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "channel_weekly_share",
            domain: QueryDomain::Channel,
            description: "Online revenue share per fiscal week",
            sql: "SELECT fin_year, fin_week, \
                         SUM(revenue) AS revenue, \
                         SUM(CASE WHEN channel = 'online' THEN revenue ELSE 0.0 END) \
                             AS online_revenue, \
                         CASE WHEN SUM(revenue) = 0 THEN 0.0 \
                              ELSE SUM(CASE WHEN channel = 'online' THEN revenue ELSE 0.0 END) \
                                   / SUM(revenue) \
                         END AS online_share \
                  FROM transactions \
                  {where} \
                  GROUP BY fin_year, fin_week \
                  ORDER BY fin_year, fin_week",
            params: vec![p_start(), p_end(), p_store()],
        },
        NamedQuery {
            name: "channel_store_split",
            domain: QueryDomain::Channel,
            description: "Revenue and baskets per store and channel",
            sql: "SELECT store_id, store_name, channel, \
                         SUM(revenue) AS revenue, \
                         COUNT(DISTINCT basket_id) AS baskets \
                  FROM transactions \
                  {where} \
                  GROUP BY store_id, store_name, channel \
                  ORDER BY store_id, channel",
            params: vec![p_start(), p_end()],
        },
        NamedQuery {
            name: "channel_item_overlap",
            domain: QueryDomain::Channel,
            description: "Items that sold through more than one channel",
            sql: "SELECT item_id, item_name, \
                         COUNT(DISTINCT channel) AS channels, \
                         SUM(revenue) AS revenue \
                  FROM transactions \
                  {where} \
                  GROUP BY item_id, item_name \
                  HAVING COUNT(DISTINCT channel) > 1 \
                  ORDER BY revenue DESC",
            params: vec![p_start(), p_end(), p_dept(), p_limit()],
        },
    ]
}
