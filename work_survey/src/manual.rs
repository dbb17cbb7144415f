/*!

This is the long-form manual for `work_survey` and `worksurvey`.

## How a survey runs

The catalog is shown in batches (5 items by default). Every item of the
current batch must receive a vote (upvote or downvote) before the batch can be
submitted. Voting twice the same way on an item removes the vote, voting the
other way replaces it. Once the last batch is submitted, the votes are
counted per category and shown as a column chart of the upvotes.

A finished survey can be restarted: all the votes are cleared and the first
batch is shown again.

## Catalog formats

The following formats are supported:
* `json` (default) an array of objects
* `csv` Comma Separated Values with a header row
* `xlsx` an Excel worksheet with a header row

All the formats use the same fields:

| field    | mandatory | meaning                                       |
|----------|-----------|-----------------------------------------------|
| `title`  | yes       | the title of the work                         |
| `author` | yes       | the author                                    |
| `school` | no        | the category (`category` is accepted as well) |
| `years`  | no        | the period, only displayed                    |

Items without a category are counted under `Unknown`. Categories are taken
literally: `Stoicism` and `stoicism` are two distinct categories.

### `json`

```text
[
  {"title": "Meditations", "author": "Marcus Aurelius", "school": "Stoicism", "years": "170-180"},
  {"title": "Ethics", "author": "Baruch Spinoza", "school": "Rationalism", "years": "1677"}
]
```

### `csv`

```text
title,author,school,years
Meditations,Marcus Aurelius,Stoicism,170-180
Ethics,Baruch Spinoza,Rationalism,1677
```

The columns may come in any order, they are found through the header row.

### `xlsx`

Same layout as the CSV file. The first worksheet is used unless
`--excel-worksheet-name` (or `excelWorksheetName` in the configuration) is
given.

## Commands

| command        | effect                                             |
|----------------|----------------------------------------------------|
| `up N`         | toggles an upvote on item N of the current batch   |
| `down N`       | toggles a downvote on item N of the current batch  |
| `submit`       | moves to the next batch, or to the results         |
| `results`      | shows the chart for the current votes              |
| `restart`      | starts over (only once the survey is finished)     |
| `help`         | lists the commands                                 |
| `quit`         | leaves the program                                 |

Items are numbered from 1 within the batch shown on screen. `up #N` and
`down #N` address the item by its position in the whole catalog (from 0).

## Configuration

Everything can be given on the command line. A configuration file in JSON
can also be passed with `--config`; the paths inside it are relative to the
configuration file. Command line options take precedence.

```text
{
  "outputSettings": {
    "surveyName": "Philosophy works",
    "outputDirectory": "out",
    "chartTitle": "Number of Works Rated Positively by School of Philosophy"
  },
  "catalogSource": {
    "provider": "json",
    "filePath": "philosophy_works.json"
  },
  "rules": {
    "batchSize": "5"
  }
}
```

 */
