//! Rule evaluation measures.
//!
//! A measure maps the four summary counts of a rule to a real number: the
//! support of the whole set, of the body (antecedent), of the head
//! (consequent), and the total transaction weight. Every measure carries
//! a preference direction: +1 when larger values indicate a better rule.
//!
//! [`Measure::LogRatio`] is listed here for completeness but is computed by
//! the item set tree itself, because it needs the frequencies of all items
//! on the path and not just the four summary counts.

use basket::Supp;

/// Signature shared by all measure functions.
pub type RuleValFn = fn(Supp, Supp, Supp, Supp) -> f64;

/// The available evaluation measures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Measure {
    /// No measure; evaluates to a constant 0.
    None,
    /// Rule confidence supp/body.
    Conf,
    /// Absolute difference of the confidence to the prior head/base.
    ConfDiff,
    /// Lift: conf/(head/base).
    Lift,
    /// Absolute difference of the lift to 1.
    LiftDiff,
    /// Difference of the lift quotient to 1.
    LiftQuot,
    /// Conviction: body·(base−head) / (base·(body−supp)).
    Cvct,
    /// Absolute difference of the conviction to 1.
    CvctDiff,
    /// Difference of the conviction quotient to 1.
    CvctQuot,
    /// Certainty factor.
    Cert,
    /// Normalized chi-squared measure (in [0, 1]).
    Chi2,
    /// Normalized chi-squared measure with Yates correction.
    Yates,
    /// Information difference to the prior (mutual information, in bits).
    Info,
    /// Binary logarithm of the quotient of actual and independence-expected
    /// support. Computed by the item set tree, not by this catalog.
    LogRatio,
}

impl Measure {
    /// The evaluation function of the measure. `None` and `LogRatio` yield
    /// the constant-zero function; callers special-case `LogRatio`.
    pub fn function(self) -> RuleValFn {
        match self {
            Measure::None | Measure::LogRatio => re_none,
            Measure::Conf => re_conf,
            Measure::ConfDiff => re_confdiff,
            Measure::Lift => re_lift,
            Measure::LiftDiff => re_liftdiff,
            Measure::LiftQuot => re_liftquot,
            Measure::Cvct => re_cvct,
            Measure::CvctDiff => re_cvctdiff,
            Measure::CvctQuot => re_cvctquot,
            Measure::Cert => re_cert,
            Measure::Chi2 => re_chi2,
            Measure::Yates => re_yates,
            Measure::Info => re_info,
        }
    }

    /// Preference direction of the measure: +1 means larger is better.
    pub fn direction(self) -> f64 {
        1.0
    }
}

pub fn re_none(_supp: Supp, _body: Supp, _head: Supp, _base: Supp) -> f64 {
    0.0
}

pub fn re_conf(supp: Supp, body: Supp, _head: Supp, _base: Supp) -> f64 {
    if body > 0 {
        supp as f64 / body as f64
    } else {
        0.0
    }
}

pub fn re_confdiff(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if base <= 0 {
        return 0.0;
    }
    (re_conf(supp, body, head, base) - head as f64 / base as f64).abs()
}

pub fn re_lift(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if body <= 0 || head <= 0 {
        return 0.0;
    }
    (supp as f64 * base as f64) / (body as f64 * head as f64)
}

pub fn re_liftdiff(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    (re_lift(supp, body, head, base) - 1.0).abs()
}

pub fn re_liftquot(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    let lift = re_lift(supp, body, head, base);
    if lift <= 0.0 {
        return 0.0;
    }
    1.0 - lift.min(1.0 / lift)
}

pub fn re_cvct(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if base <= 0 || body <= supp {
        return 0.0;
    }
    (body as f64 * (base - head) as f64) / (base as f64 * (body - supp) as f64)
}

pub fn re_cvctdiff(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    (re_cvct(supp, body, head, base) - 1.0).abs()
}

pub fn re_cvctquot(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    let cvct = re_cvct(supp, body, head, base);
    if cvct <= 0.0 {
        return 0.0;
    }
    1.0 - cvct.min(1.0 / cvct)
}

pub fn re_cert(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if base <= 0 {
        return 0.0;
    }
    let prior = head as f64 / base as f64;
    let diff = re_conf(supp, body, head, base) - prior;
    if diff >= 0.0 {
        if prior < 1.0 {
            diff / (1.0 - prior)
        } else {
            0.0
        }
    } else if prior > 0.0 {
        diff / prior
    } else {
        0.0
    }
}

pub fn re_chi2(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if head <= 0 || head >= base || body <= 0 || body >= base {
        return 0.0;
    }
    let t = supp as f64 * base as f64 - body as f64 * head as f64;
    (t * t) / (head as f64 * (base - head) as f64 * body as f64 * (base - body) as f64)
}

pub fn re_yates(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if head <= 0 || head >= base || body <= 0 || body >= base {
        return 0.0;
    }
    let t = (supp as f64 * base as f64 - body as f64 * head as f64).abs() - 0.5 * base as f64;
    if t <= 0.0 {
        return 0.0;
    }
    (t * t) / (head as f64 * (base - head) as f64 * body as f64 * (base - body) as f64)
}

pub fn re_info(supp: Supp, body: Supp, head: Supp, base: Supp) -> f64 {
    if head <= 0 || head >= base || body <= 0 || body >= base {
        return 0.0;
    }
    let n = base as f64;
    let cells = [
        (supp as f64, body as f64, head as f64),
        ((body - supp) as f64, body as f64, (base - head) as f64),
        ((head - supp) as f64, (base - body) as f64, head as f64),
        (
            (base - body - head + supp) as f64,
            (base - body) as f64,
            (base - head) as f64,
        ),
    ];
    let mut sum = 0.0;
    for &(x, row, col) in cells.iter() {
        if x > 0.0 {
            sum += x * (x * n / (row * col)).log2();
        }
    }
    sum / n
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn confidence_is_supp_over_body() {
        assert!(close(re_conf(2, 3, 4, 5), 2.0 / 3.0));
        assert!(close(re_conf(2, 0, 4, 5), 0.0));
    }

    #[test]
    fn lift_of_independent_items_is_one() {
        // supp/base == (body/base)·(head/base)
        assert!(close(re_lift(1, 2, 50, 100), 1.0));
        assert!(close(re_liftdiff(1, 2, 50, 100), 0.0));
        assert!(close(re_liftquot(1, 2, 50, 100), 0.0));
    }

    #[test]
    fn conviction_of_certain_rule_is_zero_guarded() {
        // conf = 1 would make the denominator 0
        assert!(close(re_cvct(3, 3, 4, 10), 0.0));
        assert!(close(re_cvct(2, 4, 5, 10), (4.0 * 5.0) / (10.0 * 2.0)));
    }

    #[test]
    fn certainty_factor_sides() {
        // conf 0.8 against prior 0.5: (0.8-0.5)/0.5
        assert!(close(re_cert(4, 5, 5, 10), 0.3 / 0.5));
        // conf 0.2 against prior 0.5: (0.2-0.5)/0.5
        assert!(close(re_cert(1, 5, 5, 10), -0.6));
    }

    #[test]
    fn chi2_vanishes_under_independence() {
        assert!(close(re_chi2(1, 2, 50, 100), 0.0));
        assert!(re_chi2(10, 10, 10, 100) > 0.0);
        // fully dependent 2x2 table normalizes to 1
        assert!(close(re_chi2(5, 5, 5, 10), 1.0));
    }

    #[test]
    fn info_vanishes_under_independence() {
        assert!(close(re_info(1, 2, 50, 100), 0.0));
        // perfectly correlated items carry one bit
        assert!(close(re_info(5, 5, 5, 10), 1.0));
    }

    #[test]
    fn catalog_dispatch() {
        let f = Measure::Conf.function();
        assert!(close(f(1, 2, 0, 0), 0.5));
        assert!(close(Measure::None.function()(9, 9, 9, 9), 0.0));
        assert!(close(Measure::Chi2.direction(), 1.0));
    }
}
