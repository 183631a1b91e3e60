//! 规约（Specification）
//!
//! 封装可复用、可组合的过滤条件，作为仓储查询的谓词。
//! 任意 `Fn(&T) -> bool` 闭包都自动成为规约。

/// 规约模式的核心 trait
pub trait Specification<T>: Send + Sync {
    /// 检查候选对象是否满足规约
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// 与另一个规约进行 AND 组合
    fn and<S>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        AndSpecification::new(Box::new(self), Box::new(other))
    }

    /// 与另一个规约进行 OR 组合
    fn or<S>(self, other: S) -> OrSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        OrSpecification::new(Box::new(self), Box::new(other))
    }

    /// 对规约进行 NOT 操作
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification::new(Box::new(self))
    }
}

impl<T, F> Specification<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self(candidate)
    }
}

/// 类型擦除后的规约
pub type BoxSpecification<T> = Box<dyn Specification<T>>;

/// AND 组合规约
pub struct AndSpecification<T> {
    left: BoxSpecification<T>,
    right: BoxSpecification<T>,
}

impl<T> AndSpecification<T> {
    pub fn new(left: BoxSpecification<T>, right: BoxSpecification<T>) -> Self {
        Self { left, right }
    }
}

impl<T> Specification<T> for AndSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }
}

/// OR 组合规约
pub struct OrSpecification<T> {
    left: BoxSpecification<T>,
    right: BoxSpecification<T>,
}

impl<T> OrSpecification<T> {
    pub fn new(left: BoxSpecification<T>, right: BoxSpecification<T>) -> Self {
        Self { left, right }
    }
}

impl<T> Specification<T> for OrSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }
}

/// NOT 规约
pub struct NotSpecification<T> {
    inner: BoxSpecification<T>,
}

impl<T> NotSpecification<T> {
    pub fn new(inner: BoxSpecification<T>) -> Self {
        Self { inner }
    }
}

impl<T> Specification<T> for NotSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysTrueSpec;
    impl Specification<i32> for AlwaysTrueSpec {
        fn is_satisfied_by(&self, _: &i32) -> bool {
            true
        }
    }

    struct AlwaysFalseSpec;
    impl Specification<i32> for AlwaysFalseSpec {
        fn is_satisfied_by(&self, _: &i32) -> bool {
            false
        }
    }

    #[test]
    fn test_and_specification() {
        let spec = AlwaysTrueSpec.and(AlwaysTrueSpec);
        assert!(spec.is_satisfied_by(&42));

        let spec = AlwaysTrueSpec.and(AlwaysFalseSpec);
        assert!(!spec.is_satisfied_by(&42));
    }

    #[test]
    fn test_or_and_not_specification() {
        let spec = AlwaysFalseSpec.or(AlwaysTrueSpec);
        assert!(spec.is_satisfied_by(&42));

        let spec = AlwaysTrueSpec.not();
        assert!(!spec.is_satisfied_by(&42));
    }

    #[test]
    fn closures_are_specifications() {
        let even = |n: &i32| n % 2 == 0;
        let positive = |n: &i32| *n > 0;
        let spec = even.and(positive);
        assert!(spec.is_satisfied_by(&4));
        assert!(!spec.is_satisfied_by(&-4));
        assert!(!spec.is_satisfied_by(&3));
    }
}
