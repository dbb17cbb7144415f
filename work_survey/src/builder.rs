pub use crate::config::*;

/// A builder for assembling a catalog.
///
/// The builder numbers the items in the order they are added, which is the
/// order the survey presents them in.
///
/// ```
/// pub use work_survey::builder::Builder;
/// pub use work_survey::SurveyRules;
/// # use work_survey::SurveyErrors;
///
/// let mut builder = Builder::new(&SurveyRules::DEFAULT_RULES)?;
///
/// builder.add_item_simple("Meditations", "Marcus Aurelius", "Stoicism");
/// builder.add_item("Ethics", "Spinoza", None, Some("1677"));
///
/// let survey = builder.build()?;
/// assert_eq!(survey.items().len(), 2);
/// assert_eq!(survey.items()[1].category_label(), "Unknown");
///
/// # Ok::<(), SurveyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: SurveyRules,
    pub(crate) _items: Vec<Item>,
}

impl Builder {
    pub fn new(rules: &SurveyRules) -> Result<Builder, SurveyErrors> {
        if rules.batch_size == 0 {
            return Err(SurveyErrors::InvalidBatchSize);
        }
        Ok(Builder {
            _rules: rules.clone(),
            _items: Vec::new(),
        })
    }

    /// Adds an item with a known category and no period.
    pub fn add_item_simple(&mut self, title: &str, author: &str, category: &str) -> usize {
        self.add_item(title, author, Some(category), None)
    }

    /// Adds an item and returns its index in the catalog.
    pub fn add_item(
        &mut self,
        title: &str,
        author: &str,
        category: Option<&str>,
        period: Option<&str>,
    ) -> usize {
        let index = self._items.len();
        self._items.push(Item {
            index,
            title: title.to_string(),
            author: author.to_string(),
            category: category.map(|c| c.to_string()),
            period: period.map(|p| p.to_string()),
        });
        index
    }

    pub fn len(&self) -> usize {
        self._items.len()
    }

    pub fn is_empty(&self) -> bool {
        self._items.is_empty()
    }

    pub fn items(self) -> Vec<Item> {
        self._items
    }

    pub fn build(self) -> Result<crate::Survey, SurveyErrors> {
        crate::Survey::new(self._items, &self._rules)
    }
}
