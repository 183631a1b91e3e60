//! 分页结果（PagedList）
//!
//! 总数基于过滤后的集合计算，当前页基于过滤并排序后的同一集合切片 `[i*s, i*s+s)`。
//! 页码从 0 开始；超出范围的页返回空列表与正确的总数。
//!
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uow_domain::error::{DomainError, DomainResult};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 分页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub size: usize,
}

impl Page {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    /// 下一页
    pub fn next(self) -> Self {
        Self {
            index: self.index.saturating_add(1),
            ..self
        }
    }

    fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PagedList<T> {
    items: Vec<T>,
    page_index: usize,
    page_size: usize,
    total_count: usize,
}

impl<T> PagedList<T> {
    /// 由已过滤、已排序的完整结果集切出一页
    pub fn from_rows(rows: Vec<T>, page: Page) -> DomainResult<Self> {
        if page.size == 0 {
            return Err(DomainError::invalid_value("page size must be greater than zero"));
        }
        let total_count = rows.len();
        let items = rows.into_iter().skip(page.offset()).take(page.size).collect();
        Ok(Self {
            items,
            page_index: page.index,
            page_size: page.size,
            total_count,
        })
    }

    pub fn empty(page: Page) -> Self {
        Self {
            items: Vec::new(),
            page_index: page.index,
            page_size: page.size,
            total_count: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index.saturating_add(1) < self.total_pages()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// 对当前页逐项投影，分页信息保持不变
    pub fn map<R, F>(self, f: F) -> PagedList<R>
    where
        F: FnMut(T) -> R,
    {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}

impl<T> IntoIterator for PagedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// 序列化时附带派生字段，便于直接作为接口响应
impl<T: Serialize> Serialize for PagedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PagedList", 7)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("page_index", &self.page_index)?;
        state.serialize_field("page_size", &self.page_size)?;
        state.serialize_field("total_count", &self.total_count)?;
        state.serialize_field("total_pages", &self.total_pages())?;
        state.serialize_field("has_previous_page", &self.has_previous_page())?;
        state.serialize_field("has_next_page", &self.has_next_page())?;
        state.end()
    }
}
